/*
 * Copyright Amazon.com, Inc. or its affiliates. All Rights Reserved.
 * SPDX-License-Identifier: Apache-2.0
 */

use std::env;
use std::io::{self, Write};
use std::sync::{Arc, Mutex};
use tracing::subscriber::DefaultGuard;
use tracing_subscriber::fmt::MakeWriter;
use tracing_subscriber::EnvFilter;

const ECHO_ENV_VAR: &str = "INVOKE_TEST_LOGS";

/// Keeps log capturing active until dropped.
#[derive(Debug)]
pub struct LogCaptureGuard {
    _guard: DefaultGuard,
}

/// Logs captured on the current thread.
#[derive(Clone, Debug, Default)]
pub struct CapturedLogs {
    buf: Arc<Mutex<Vec<u8>>>,
}

impl CapturedLogs {
    /// Everything logged so far.
    pub fn contents(&self) -> String {
        let buf = self.buf.lock().unwrap();
        String::from_utf8_lossy(&buf).into_owned()
    }

    /// Returns true if any log line contains `needle`.
    pub fn contains(&self, needle: &str) -> bool {
        self.contents().contains(needle)
    }
}

/// Capture every event at `trace` and above on the current thread.
///
/// Set `INVOKE_TEST_LOGS` to also echo the captured output through the test harness. Its
/// value, if it is not `1` or `true`, is used as an env filter for the echoed lines.
#[must_use]
pub fn capture_test_logs() -> (LogCaptureGuard, CapturedLogs) {
    let logs = CapturedLogs::default();
    let echo = env::var(ECHO_ENV_VAR).ok();
    let filter = match echo.as_deref() {
        None | Some("1") | Some("true") => EnvFilter::new("trace"),
        Some(filter) => EnvFilter::new(filter),
    };
    let subscriber = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_ansi(false)
        .with_writer(CaptureWriter {
            logs: logs.clone(),
            echo: echo.is_some(),
        })
        .finish();
    let guard = LogCaptureGuard {
        _guard: tracing::subscriber::set_default(subscriber),
    };
    (guard, logs)
}

#[derive(Clone, Debug)]
struct CaptureWriter {
    logs: CapturedLogs,
    echo: bool,
}

impl Write for CaptureWriter {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.logs.buf.lock().unwrap().extend_from_slice(buf);
        if self.echo {
            // print! goes through the harness's output capture, unlike writing to stdout
            print!("{}", String::from_utf8_lossy(buf));
        }
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

impl<'a> MakeWriter<'a> for CaptureWriter {
    type Writer = CaptureWriter;

    fn make_writer(&'a self) -> Self::Writer {
        self.clone()
    }
}
