// SPDX-License-Identifier: Apache-2.0

use ctscan::config::Config;
use ctscan::supervisor::Supervisor;
use log::info;

#[tokio::main(flavor = "multi_thread", worker_threads = 4)]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    env_logger::init();

    let config = Config::from_env();
    info!(
        "starting ctscan: {} worker(s), queue capacity {}, batch size {}, block size {}",
        config.worker_count, config.queue_capacity, config.batch_size, config.max_block_size
    );
    if config.debug_memory {
        info!("DEBUG_MEMORY set, ignored: belongs to the read-side service");
    }

    let store = ctscan_store::Store::connect(&config.database_url).await?;
    store.init_schema().await?;

    Supervisor::new(config, store).run().await;
    Ok(())
}
