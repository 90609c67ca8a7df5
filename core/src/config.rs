use fugit::MillisDurationU32;

use crate::adc::Channel;
use crate::task::SETTLE_SAMPLES;
use crate::wind::DEFAULT_SAMPLE_WINDOW;

/// Station settings. The tick rate is fixed at [`TICK_RATE`], so it is not one of them.
///
/// [`TICK_RATE`]: crate::adc::TICK_RATE
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Config {
    /// Length of the pulse counting window of one wind sample
    pub sample_window_ms: u32,
    /// Converter input the wind vane potentiometer is wired to
    pub vane_channel: Channel,
    /// Samples discarded after the vane task takes over the converter
    pub settle_samples: u8,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            sample_window_ms: DEFAULT_SAMPLE_WINDOW.to_millis(),
            vane_channel: Channel::FIRST,
            settle_samples: SETTLE_SAMPLES,
        }
    }
}

impl Config {
    pub fn sample_window(&self) -> MillisDurationU32 {
        MillisDurationU32::from_ticks(self.sample_window_ms)
    }

    #[cfg(feature = "config")]
    pub fn load(path: Option<&std::path::Path>) -> Result<Self, Box<dyn std::error::Error>> {
        let paths: Vec<std::path::PathBuf> = match path {
            Some(p) => vec![p.into()],
            None => std::env::current_dir()?
                .ancestors()
                .map(|path| path.join("station-config.toml"))
                .collect(),
        };

        let mut last_error = None;

        for path in paths {
            match std::fs::read_to_string(&path) {
                Ok(config_string) => return Ok(toml::from_str(&config_string)?),
                Err(e) => last_error = Some(e),
            }
        }

        match last_error {
            Some(e) => Err(e.into()),
            None => Err("no configuration path to search".into()),
        }
    }
}

#[cfg(all(test, feature = "config"))]
mod tests {
    use super::*;

    #[test]
    fn missing_fields_use_defaults() {
        let config: Config = toml::from_str("sample_window_ms = 1000").unwrap();

        assert_eq!(config.sample_window().to_millis(), 1000);
        assert_eq!(config.vane_channel, Channel::FIRST);
        assert_eq!(config.settle_samples, SETTLE_SAMPLES);
    }

    #[test]
    fn defaults_match_the_sensor() {
        let config = Config::default();

        assert_eq!(config.sample_window_ms, 2250);
        assert_eq!(config.vane_channel, Channel::FIRST);
    }

    #[test]
    fn tick_rate_is_not_configurable() {
        assert!(toml::from_str::<Config>("tick_rate_hz = 1000").is_err());

        let config: Config = toml::from_str("settle_samples = 2").unwrap();
        let vane = crate::task::AdcTask::with_settle_samples(
            config.vane_channel,
            (),
            config.settle_samples,
        );
        assert_eq!(vane.sample_rate(), crate::adc::TICK_RATE);
    }

    #[test]
    fn out_of_range_channel_is_rejected() {
        let parsed = toml::from_str::<Config>("vane_channel = 8");
        assert!(parsed.is_err());

        let config: Config = toml::from_str("vane_channel = 7").unwrap();
        assert_eq!(config.vane_channel.id(), 7);
    }

    #[test]
    fn load_reads_given_file() {
        let path = std::env::temp_dir().join("windsampler-load-reads-given-file.toml");
        std::fs::write(&path, "settle_samples = 2\nsample_window_ms = 3000\n").unwrap();

        let config = Config::load(Some(path.as_path())).unwrap();
        std::fs::remove_file(&path).unwrap();

        assert_eq!(config.settle_samples, 2);
        assert_eq!(config.sample_window_ms, 3000);
    }

    #[test]
    fn load_reports_missing_file() {
        let path = std::env::temp_dir().join("windsampler-no-such-config.toml");
        assert!(Config::load(Some(path.as_path())).is_err());
    }
}
