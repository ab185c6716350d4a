use config::BridgeConfig;

/// Platform-version dependent capabilities, resolved once at startup.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Features {
    /// API level the features were derived from.
    pub api_level: u32,
    /// Ringing calls can be answered programmatically.
    pub answer_call: bool,
    /// The active call can be ended directly.
    pub direct_end_call: bool,
    /// The interruption filter can be changed.
    pub dnd_policy: bool,
}

impl Features {
    /// Derive features from the platform API level and configured floors.
    pub fn resolve(api_level: u32, cfg: &BridgeConfig) -> Self {
        Self {
            api_level,
            answer_call: api_level >= cfg.answer_call_min_api,
            direct_end_call: api_level >= cfg.end_call_min_api,
            dnd_policy: api_level >= cfg.dnd_min_api,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn floors_are_inclusive() {
        let cfg = BridgeConfig::default();
        let f = Features::resolve(28, &cfg);
        assert!(f.answer_call && f.direct_end_call && f.dnd_policy);

        let f = Features::resolve(27, &cfg);
        assert!(f.answer_call);
        assert!(!f.direct_end_call);

        let f = Features::resolve(22, &cfg);
        assert!(!f.answer_call && !f.direct_end_call && !f.dnd_policy);
    }
}
