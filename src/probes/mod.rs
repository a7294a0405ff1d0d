//! Built-in gateway probes.
//!
//! Each probe is a self-contained check or benchmark against the gateway,
//! carrying its own prometheus collectors. The engine never sees concrete
//! probe types; everything goes through the [`Probe`](crate::core::probe::Probe)
//! contract.

mod ipns;
mod known_good;
mod non_exist;
mod random_local;
mod random_pinning;

pub use ipns::IpnsBench;
pub use known_good::KnownGoodCheck;
pub use non_exist::NonExistCheck;
pub use random_local::RandomLocalBench;
pub use random_pinning::RandomPinningBench;

use std::sync::Arc;

use prometheus::{Histogram, HistogramOpts, IntCounter, Opts};
use rand::RngCore;

use crate::core::probe::Probe;

pub const KIB: usize = 1024;
pub const MIB: usize = 1024 * KIB;

const NAMESPACE: &str = "gwmon";

/// The default recurring probe set: hourly benchmarks at two payload sizes
/// plus the fixed-content and negative-lookup checks.
///
/// The pinning benchmark is not part of the default set; add it when a
/// pinning service is configured.
pub fn all() -> Vec<Arc<dyn Probe>> {
    vec![
        Arc::new(RandomLocalBench::new("0 * * * *", 16 * MIB)),
        Arc::new(RandomLocalBench::new("0 * * * *", 256 * MIB)),
        Arc::new(IpnsBench::new("0 * * * *", 16 * MIB)),
        Arc::new(IpnsBench::new("0 * * * *", 256 * MIB)),
        Arc::new(KnownGoodCheck::new(
            "0 * * * *",
            vec![(
                "/ipfs/Qmc5gCcjYypU7y28oCALwfSvxCBskLuPKWpK4qpterKC7z".to_string(),
                b"Hello World!\r\n".to_vec(),
            )],
        )),
        Arc::new(NonExistCheck::new("0 * * * *")),
    ]
}

pub(crate) fn random_bytes(len: usize) -> Vec<u8> {
    let mut buf = vec![0u8; len];
    rand::thread_rng().fill_bytes(&mut buf);
    buf
}

/// Millisecond latency histogram with buckets from 10 ms to ~5.5 min.
pub(crate) fn latency_histogram(
    subsystem: &str,
    name: &str,
    help: &str,
    size: Option<usize>,
) -> Histogram {
    let buckets = prometheus::exponential_buckets(10.0, 2.0, 16).expect("static bucket layout");
    let mut opts = HistogramOpts::new(name, help)
        .namespace(NAMESPACE)
        .subsystem(subsystem)
        .buckets(buckets);
    if let Some(size) = size {
        opts = opts.const_label("size", size.to_string());
    }
    Histogram::with_opts(opts).expect("static histogram opts")
}

pub(crate) fn probe_counter(
    subsystem: &str,
    name: &str,
    help: &str,
    size: Option<usize>,
) -> IntCounter {
    let mut opts = Opts::new(name, help).namespace(NAMESPACE).subsystem(subsystem);
    if let Some(size) = size {
        opts = opts.const_label("size", size.to_string());
    }
    IntCounter::with_opts(opts).expect("static counter opts")
}
