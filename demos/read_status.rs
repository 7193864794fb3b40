//! Connects to a thermometer by address and prints one reading per probe.
//!
//! ```text
//! cargo run --example read_status -- AA:BB:CC:DD:EE:FF
//! ```

use vivosun_thermo::{ClientConfig, Probe, TemperatureUnit, ThermoClient};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt().with_writer(std::io::stderr).init();

    let address = std::env::args()
        .nth(1)
        .ok_or_else(|| anyhow::anyhow!("usage: read_status <device address>"))?;

    let client = ThermoClient::find(&address, ClientConfig::default()).await?;
    client.connect().await?;

    let result = async {
        let mut probes = vec![Probe::Main];
        if client.has_external_probe().await? {
            probes.push(Probe::External);
        }
        for probe in probes {
            let temperature = client.current_temperature(probe, TemperatureUnit::Celsius).await?;
            let humidity = client.current_humidity(probe).await?;
            let vpd = client.current_vpd(probe).await?;
            println!("{probe}: {temperature:.1}°C, {humidity:.1}%, {vpd:.2} kPa");
        }
        Ok::<_, vivosun_thermo::Error>(())
    }
    .await;

    client.disconnect().await?;
    Ok(result?)
}
