use rayon::ThreadPoolBuilder;
use tracing::debug;

/// Sizes the global rayon pool from `auto` or a thread count.
pub fn configure_threads(spec: &str) -> usize {
    let count = if spec.eq_ignore_ascii_case("auto") {
        num_cpus::get()
    } else {
        spec.parse().unwrap_or_else(|_| num_cpus::get())
    };
    let _ = ThreadPoolBuilder::new().num_threads(count).build_global();
    debug!(threads = count, "configured worker pool");
    count
}

/// File stem for one figure-of-merit series, e.g. `fom_Freq` or `fom_Time_xx`.
pub fn series_stem(variable: &str, channels: &[beamcmp_core::Channel], each: bool) -> String {
    match channels {
        [single] if each => format!("fom_{variable}_{single}"),
        _ => format!("fom_{variable}"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use beamcmp_core::Channel;

    #[test]
    fn series_stems() {
        assert_eq!(series_stem("Freq", &Channel::ALL, false), "fom_Freq");
        assert_eq!(series_stem("Time", &[Channel::Q], true), "fom_Time_Q");
        assert_eq!(series_stem("Time", &[Channel::Q], false), "fom_Time");
    }
}
