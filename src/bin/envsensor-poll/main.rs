mod args;

use std::{process::ExitCode, thread, time::Duration};

use anyhow::{Context as _, Result};
use args::Args;
use clap::Parser as _;
use envsensor::{
    common::{HardwareControl, LinkTransport, StdDelay},
    config::SensorConfig,
    poller::Poller,
    recovery::{NullControl, SysfsControl},
    session::SensorSession,
    transport::{SerialLink, SimulatedLink},
};
use log::info;

fn main() -> ExitCode {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info"))
        .init();

    if let Err(e) = run() {
        log::error!("{e:#}");
        return ExitCode::from(1);
    }

    ExitCode::from(0)
}

fn run() -> Result<()> {
    // `.env` may set ENVSENSOR_SYSFS_ROOT, which clap reads while parsing
    dotenv::dotenv().ok();
    let args = Args::parse();
    let mut config = SensorConfig::from_env_except(&args.overridden_vars())
        .context("invalid ENVSENSOR_* configuration")?;
    args.apply(&mut config);

    if config.simulate {
        info!("running against the simulated sensor");
        poll(SimulatedLink::new(), NullControl, &config, args.samples)
    } else {
        let control = SysfsControl::with_root(&args.sysfs_root);
        poll(SerialLink::new(), control, &config, args.samples)
    }
}

fn poll<L, H>(link: L, control: H, config: &SensorConfig, samples: Option<u64>) -> Result<()>
where
    L: LinkTransport + Send + 'static,
    H: HardwareControl + Send + 'static,
{
    let session = SensorSession::from_config(link, StdDelay, control, config);
    let poller = Poller::spawn(session, config.poll_interval)
        .context("failed to start poller thread")?;
    let latest = poller.latest();

    let mut seen = 0;
    loop {
        thread::sleep(config.poll_interval.min(Duration::from_secs(1)));

        let Some(sample) = latest.get() else { continue };
        if sample.sequence == seen {
            continue;
        }
        seen = sample.sequence;

        let r = sample.reading;
        info!(
            "#{seen}: {:.2} °C, {:.2} %RH, {} lx, {:.3} hPa, {:.2} dB, {} ppb eTVOC, {} ppm eCO2, DI {:.2}, heat stroke {:.2} °C",
            r.temperature_celsius,
            r.humidity_percent,
            r.illuminance_lux,
            r.pressure_hpa,
            r.noise_db,
            r.etvoc_ppb,
            r.eco2_ppm,
            r.discomfort_index,
            r.heat_stroke_celsius,
        );

        if samples.is_some_and(|n| seen >= n) {
            break;
        }
    }

    poller.stop();
    Ok(())
}
