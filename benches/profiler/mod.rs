// SPDX-FileCopyrightText: 2026 Bruno Meilick
// SPDX-License-Identifier: LicenseRef-Nereid-FreeUse-NoCopy-NoDerivatives
//
// All rights reserved.
//
// This file is part of livecanvas and is proprietary software.
// Unauthorized copying, modification, or distribution is prohibited.

use std::time::Duration;

use criterion::Criterion;

use pprof::criterion::{Output, PProfProfiler};

/// Bench knobs read from the environment so CI and local profiling can share one binary.
struct BenchSettings {
    profile_frequency: i32,
    sample_size: usize,
    warm_up: Duration,
    measurement: Duration,
}

impl BenchSettings {
    fn from_env() -> Self {
        Self {
            profile_frequency: env_parse("PROFILE_FREQ", 100i32).clamp(1, 1000),
            sample_size: env_parse("BENCH_SAMPLE_SIZE", 50usize).clamp(10, 200),
            warm_up: Duration::from_secs(env_parse("BENCH_WARMUP_SECS", 2u64).clamp(1, 60)),
            measurement: Duration::from_secs(env_parse("BENCH_MEASUREMENT_SECS", 4u64).clamp(1, 120)),
        }
    }
}

fn env_parse<T: std::str::FromStr>(name: &str, default: T) -> T {
    std::env::var(name).ok().and_then(|raw| raw.trim().parse::<T>().ok()).unwrap_or(default)
}

pub fn criterion() -> Criterion {
    let settings = BenchSettings::from_env();
    Criterion::default()
        .sample_size(settings.sample_size)
        .warm_up_time(settings.warm_up)
        .measurement_time(settings.measurement)
        .with_profiler(PProfProfiler::new(settings.profile_frequency, Output::Flamegraph(None)))
}
