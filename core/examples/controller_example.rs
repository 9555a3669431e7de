// Watch for boot mode cameras with the USB adapters and upload firmware until Ctrl+C.
//
//     cargo run -p camboot_core --example controller_example -- /path/to/firmware/dir
use anyhow::Result;
use camboot_core::{AgentConfig, LifecycleController};
use log::info;

#[tokio::main]
async fn main() -> Result<()> {
    env_logger::init();

    let mut config = AgentConfig::default();
    if let Some(dir) = std::env::args().nth(1) {
        config = config.with_firmware_dir(dir);
    }
    info!("Firmware expected at {}", config.firmware_locator().resolve()?.display());

    let controller = LifecycleController::with_usb(config);
    controller.start().await?;

    info!("Controller is running. Press Ctrl+C to shut down.");
    tokio::signal::ctrl_c().await?;

    controller.stop().await;
    info!("Controller stopped. Exiting.");
    Ok(())
}
