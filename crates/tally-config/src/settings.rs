use anyhow::{bail, Result};
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Typed view of the settings the daemon and CLI read. Absent keys take the
/// defaults below; present keys must be the right type and in range.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BoardSettings {
    pub base_points: i64,
    pub poll_interval_ms: u64,
    pub countdown_from: u32,
    pub countdown_interval_ms: u64,
    pub countup_steps: u32,
    pub countup_interval_ms: u64,
    pub confetti_ms: u64,
    /// How often the daemon feeds its clock into the reveal timers.
    pub driver_interval_ms: u64,
    pub bind_addr: Option<String>,
}

impl Default for BoardSettings {
    fn default() -> Self {
        Self {
            base_points: 150,
            poll_interval_ms: 3_000,
            countdown_from: 10,
            countdown_interval_ms: 1_000,
            countup_steps: 80,
            countup_interval_ms: 20,
            confetti_ms: 6_000,
            driver_interval_ms: 20,
            bind_addr: None,
        }
    }
}

impl BoardSettings {
    pub fn from_config_json(config: &Value) -> Result<Self> {
        let d = Self::default();
        let s = Self {
            base_points: read_i64(config, "/scoring/base_points")?.unwrap_or(d.base_points),
            poll_interval_ms: read_u64(config, "/board/poll_interval_ms")?
                .unwrap_or(d.poll_interval_ms),
            countdown_from: read_u32(config, "/reveal/countdown_from")?
                .unwrap_or(d.countdown_from),
            countdown_interval_ms: read_u64(config, "/reveal/countdown_interval_ms")?
                .unwrap_or(d.countdown_interval_ms),
            countup_steps: read_u32(config, "/reveal/countup_steps")?.unwrap_or(d.countup_steps),
            countup_interval_ms: read_u64(config, "/reveal/countup_interval_ms")?
                .unwrap_or(d.countup_interval_ms),
            confetti_ms: read_u64(config, "/reveal/confetti_ms")?.unwrap_or(d.confetti_ms),
            driver_interval_ms: read_u64(config, "/reveal/driver_interval_ms")?
                .unwrap_or(d.driver_interval_ms),
            bind_addr: read_string(config, "/daemon/bind_addr")?,
        };
        s.validate()?;
        Ok(s)
    }

    fn validate(&self) -> Result<()> {
        let positive = [
            ("/board/poll_interval_ms", self.poll_interval_ms),
            ("/reveal/countdown_interval_ms", self.countdown_interval_ms),
            ("/reveal/countup_interval_ms", self.countup_interval_ms),
            ("/reveal/driver_interval_ms", self.driver_interval_ms),
            ("/reveal/countdown_from", u64::from(self.countdown_from)),
            ("/reveal/countup_steps", u64::from(self.countup_steps)),
        ];
        for (ptr, v) in positive {
            if v == 0 {
                bail!("CONFIG_INVALID {ptr}: must be > 0");
            }
        }
        Ok(())
    }
}

fn read_i64(config: &Value, ptr: &str) -> Result<Option<i64>> {
    match config.pointer(ptr) {
        None | Some(Value::Null) => Ok(None),
        Some(v) => match v.as_i64() {
            Some(n) => Ok(Some(n)),
            None => bail!("CONFIG_INVALID {ptr}: expected integer, got {v}"),
        },
    }
}

fn read_u64(config: &Value, ptr: &str) -> Result<Option<u64>> {
    match config.pointer(ptr) {
        None | Some(Value::Null) => Ok(None),
        Some(v) => match v.as_u64() {
            Some(n) => Ok(Some(n)),
            None => bail!("CONFIG_INVALID {ptr}: expected non-negative integer, got {v}"),
        },
    }
}

fn read_u32(config: &Value, ptr: &str) -> Result<Option<u32>> {
    match read_u64(config, ptr)? {
        None => Ok(None),
        Some(n) => match u32::try_from(n) {
            Ok(n) => Ok(Some(n)),
            Err(_) => bail!("CONFIG_INVALID {ptr}: {n} out of range"),
        },
    }
}

fn read_string(config: &Value, ptr: &str) -> Result<Option<String>> {
    match config.pointer(ptr) {
        None | Some(Value::Null) => Ok(None),
        Some(Value::String(s)) if s.trim().is_empty() => Ok(None),
        Some(Value::String(s)) => Ok(Some(s.trim().to_string())),
        Some(v) => bail!("CONFIG_INVALID {ptr}: expected string, got {v}"),
    }
}
