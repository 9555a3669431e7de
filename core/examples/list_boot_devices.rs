// Print the cameras currently attached in boot mode.
use anyhow::Result;
use camboot_core::usb::UsbBootEnumerator;
use camboot_core::DeviceEnumerator;

#[tokio::main]
async fn main() -> Result<()> {
    env_logger::init();

    let devices = UsbBootEnumerator::new().enumerate(true).await?;
    if devices.is_empty() {
        println!("No camera in boot mode found");
    }
    for device in devices {
        println!("{}", device.describe());
    }
    Ok(())
}
