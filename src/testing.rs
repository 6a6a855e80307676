// src/testing.rs

// Mocks shared by the unit tests.

use crate::common::{Delay, HardwareControl, LinkSettings, LinkTransport};
use core::time::Duration;
use std::collections::VecDeque;
use std::io;
use std::path::Path;

// --- Mock Delay ---
#[derive(Debug, Default)]
pub struct RecordingDelay {
    pub waits: Vec<Duration>,
}

impl RecordingDelay {
    pub fn total(&self) -> Duration {
        self.waits.iter().sum()
    }
}

impl Delay for RecordingDelay {
    fn delay(&mut self, duration: Duration) {
        self.waits.push(duration);
    }
}

// --- Mock Link Error ---
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct MockLinkError(pub &'static str);

// --- Mock Link ---
/// Link whose responses are scripted per write. Each pushed response is a
/// list of chunks; every `read` call hands out (part of) the next chunk.
#[derive(Debug, Default)]
pub struct ScriptedLink {
    open: bool,
    pub opens: u32,
    pub closes: u32,
    pub flushes: u32,
    pub writes: Vec<Vec<u8>>,
    pub fail_open: bool,
    pub fail_write: bool,
    pub fail_read: bool,
    responses: VecDeque<Vec<Vec<u8>>>,
    pending: VecDeque<Vec<u8>>,
}

impl ScriptedLink {
    pub fn new() -> Self {
        ScriptedLink::default()
    }

    /// Queues a response delivered as the given chunks.
    pub fn push_response(&mut self, chunks: Vec<Vec<u8>>) {
        self.responses.push_back(chunks);
    }

    /// Queues a response delivered in one piece.
    pub fn push_frame(&mut self, frame: &[u8]) {
        self.push_response(vec![frame.to_vec()]);
    }

    pub fn queued_responses(&self) -> usize {
        self.responses.len()
    }
}

impl LinkTransport for ScriptedLink {
    type Error = MockLinkError;

    fn open(&mut self, _settings: &LinkSettings) -> Result<(), Self::Error> {
        if self.fail_open {
            return Err(MockLinkError("open"));
        }
        self.open = true;
        self.opens += 1;
        self.pending.clear();
        Ok(())
    }

    fn close(&mut self) {
        if self.open {
            self.open = false;
            self.closes += 1;
        }
    }

    fn is_open(&self) -> bool {
        self.open
    }

    fn write_all(&mut self, bytes: &[u8]) -> Result<(), Self::Error> {
        if self.fail_write {
            return Err(MockLinkError("write"));
        }
        self.writes.push(bytes.to_vec());
        self.pending = self.responses.pop_front().unwrap_or_default().into();
        Ok(())
    }

    fn bytes_available(&mut self) -> Result<usize, Self::Error> {
        Ok(self.pending.front().map_or(0, Vec::len))
    }

    fn read(&mut self, buf: &mut [u8]) -> Result<usize, Self::Error> {
        if self.fail_read {
            return Err(MockLinkError("read"));
        }
        let Some(mut chunk) = self.pending.pop_front() else {
            return Ok(0);
        };
        let n = chunk.len().min(buf.len());
        buf[..n].copy_from_slice(&chunk[..n]);
        if n < chunk.len() {
            self.pending.push_front(chunk.split_off(n));
        }
        Ok(n)
    }

    fn flush_input(&mut self) -> Result<(), Self::Error> {
        self.flushes += 1;
        self.pending.clear();
        Ok(())
    }
}

// --- Mock Hardware Control ---
#[derive(Debug)]
pub struct MockControl {
    pub calls: Vec<String>,
    pub controller: Option<String>,
    pub usb_device: Option<String>,
    /// Number of `link_present` polls answering false before the link shows
    /// up; `None` never shows it.
    pub link_appears_after: Option<u32>,
    /// Error kind returned by `register_usb_id`.
    pub register_error: Option<io::ErrorKind>,
    /// Directive (method name) that fails with an I/O error.
    pub fail_step: Option<&'static str>,
    polls: u32,
}

impl Default for MockControl {
    fn default() -> Self {
        MockControl {
            calls: Vec::new(),
            controller: None,
            usb_device: None,
            link_appears_after: Some(0),
            register_error: None,
            fail_step: None,
            polls: 0,
        }
    }
}

impl MockControl {
    pub fn with_controller(handle: &str) -> Self {
        MockControl {
            controller: Some(handle.to_string()),
            ..MockControl::default()
        }
    }

    pub fn with_usb_device(handle: &str) -> Self {
        MockControl {
            usb_device: Some(handle.to_string()),
            ..MockControl::default()
        }
    }

    fn directive(&mut self, name: &'static str, call: String) -> io::Result<()> {
        self.calls.push(call);
        if self.fail_step == Some(name) {
            Err(io::Error::other(format!("{name} failed")))
        } else {
            Ok(())
        }
    }
}

impl HardwareControl for MockControl {
    fn locate_controller(&mut self, driver: &str) -> io::Result<Option<String>> {
        self.directive("locate_controller", format!("locate_controller {driver}"))?;
        Ok(self.controller.clone())
    }

    fn locate_usb_device(&mut self, vendor: u16, product: u16) -> io::Result<Option<String>> {
        self.directive(
            "locate_usb_device",
            format!("locate_usb_device {vendor:04x} {product:04x}"),
        )?;
        Ok(self.usb_device.clone())
    }

    fn unbind_controller(&mut self, driver: &str, handle: &str) -> io::Result<()> {
        self.directive(
            "unbind_controller",
            format!("unbind_controller {driver} {handle}"),
        )
    }

    fn bind_controller(&mut self, driver: &str, handle: &str) -> io::Result<()> {
        self.directive(
            "bind_controller",
            format!("bind_controller {driver} {handle}"),
        )
    }

    fn rescan_bus(&mut self) -> io::Result<()> {
        self.directive("rescan_bus", "rescan_bus".to_string())
    }

    fn unbind_usb_device(&mut self, handle: &str) -> io::Result<()> {
        self.directive("unbind_usb_device", format!("unbind_usb_device {handle}"))
    }

    fn bind_usb_device(&mut self, handle: &str) -> io::Result<()> {
        self.directive("bind_usb_device", format!("bind_usb_device {handle}"))
    }

    fn load_driver(&mut self, driver: &str) -> io::Result<()> {
        self.directive("load_driver", format!("load_driver {driver}"))
    }

    fn register_usb_id(&mut self, driver: &str, vendor: u16, product: u16) -> io::Result<()> {
        self.directive(
            "register_usb_id",
            format!("register_usb_id {driver} {vendor:04x} {product:04x}"),
        )?;
        match self.register_error {
            Some(kind) => Err(io::Error::from(kind)),
            None => Ok(()),
        }
    }

    fn link_present(&mut self, path: &Path) -> bool {
        self.calls.push(format!("link_present {}", path.display()));
        let present = self
            .link_appears_after
            .is_some_and(|after| self.polls >= after);
        self.polls += 1;
        present
    }
}
