#![allow(dead_code, unused_imports)]

pub use corewatch_test_utils::builders;
pub use corewatch_test_utils::fake_refresher::RecordingRefresher;
pub use corewatch_test_utils::fake_source::{ManualWatcher, manual_source, start_manual_hub};
pub use corewatch_test_utils::fake_transport::RecordingTransport;
pub use corewatch_test_utils::{eventually, init_tracing, with_timeout};
