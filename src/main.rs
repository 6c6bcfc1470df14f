// src/main.rs
use anyhow::{Context, Result};
use log::{info, warn};
use neuroflag::dsp::{Rhythm, SimulatedSource};
use neuroflag::{FeedbackSession, PipelineConfig};
// Muse-style headset: 4 channels at 256 Hz
const SAMPLE_RATE_HZ: f64 = 256.0;
const CHANNELS: [&str; 4] = ["TP9", "AF7", "AF8", "TP10"];
const PHASE_SECONDS: f64 = 10.0;
const TOTAL_SECONDS: f64 = 40.0;
fn load_config() -> Result<PipelineConfig> {
    match std::env::args().nth(1) {
        Some(path) => PipelineConfig::load(&path)
            .with_context(|| format!("failed to load pipeline config from {path}")),
        None => Ok(PipelineConfig::default()),
    }
}
// 模拟 "放松" 与 "专注" 两种状态交替
fn rhythms_for(focused: bool) -> Vec<Rhythm> {
    let (theta, beta) = if focused { (4.0, 12.0) } else { (12.0, 4.0) };
    vec![
        Rhythm { freq_hz: 6.0, amplitude: theta },
        Rhythm { freq_hz: 10.0, amplitude: 6.0 },
        Rhythm { freq_hz: 18.0, amplitude: beta },
        // mains hum for the notch to remove
        Rhythm { freq_hz: 60.0, amplitude: 25.0 },
    ]
}
fn main() -> Result<()> {
    env_logger::init();
    let config = load_config()?;
    let chunk_samples = config.chunk_samples(SAMPLE_RATE_HZ);
    let labels = CHANNELS.iter().map(|s| s.to_string()).collect();
    let mut source = SimulatedSource::new(SAMPLE_RATE_HZ, labels, chunk_samples, 0x5EED)
        .with_noise(8.0);
    source.set_rhythms(rhythms_for(false));
    let mut session = FeedbackSession::new(source, config);
    let cycles_per_phase = ((PHASE_SECONDS * SAMPLE_RATE_HZ) / chunk_samples as f64) as usize;
    let total_cycles = ((TOTAL_SECONDS * SAMPLE_RATE_HZ) / chunk_samples as f64) as usize;
    info!("simulating {TOTAL_SECONDS} s in {total_cycles} cycles of {chunk_samples} samples");
    for cycle in 0..total_cycles {
        if cycle > 0 && cycle % cycles_per_phase.max(1) == 0 {
            let focused = (cycle / cycles_per_phase.max(1)) % 2 == 1;
            info!("switching to {} phase", if focused { "focused" } else { "relaxed" });
            session.source_mut().set_rhythms(rhythms_for(focused));
        }
        match session.pump_once() {
            Ok(Some(out)) => info!(
                "cycle {:>4}  metric {:>8.3}  smoothed {:?}",
                cycle + 1,
                out.metric,
                out.smoothed.as_slice()
            ),
            Ok(None) => break,
            // 单个周期失败不影响后续周期
            Err(err) if !err.is_configuration() => warn!("cycle {} skipped: {err}", cycle + 1),
            Err(err) => return Err(err).context("pipeline could not be created"),
        }
    }
    Ok(())
}
