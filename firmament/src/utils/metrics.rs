#[cfg(feature = "metrics")]
mod imp {
    use std::time::Instant;

    use log::info;

    pub fn measure<T>(label: &str, f: impl FnOnce() -> T) -> T {
        let tt = Instant::now();
        let result = f();

        info!(
            "{label}: {}",
            humantime::format_duration(tt.elapsed())
        );

        result
    }
}

#[cfg(not(feature = "metrics"))]
mod imp {
    pub fn measure<T>(_: &str, f: impl FnOnce() -> T) -> T {
        f()
    }
}

pub use self::imp::*;
