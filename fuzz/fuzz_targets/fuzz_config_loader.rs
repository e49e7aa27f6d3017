#![no_main]
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &str| {
    // Parse and validation errors are fine; panics are not.
    if let Ok(cfg) = scalecam_config::load_toml(data)
        && cfg.validate().is_ok()
    {
        let eff = cfg.effective();
        assert!(eff.min_delta_g >= 0.0);
        assert!(eff.auth_deadline_ms >= 1);
    }
});
