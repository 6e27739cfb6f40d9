//! Display Enumeration
//!
//! Thin capability interface over the OS display-enumeration API, plus a
//! configuration-backed implementation and the Windows GDI implementation.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use tracing::debug;

use crate::multimon::{MonitorError, Result};

/// One physical display as reported by the OS
///
/// Immutable snapshot taken during a discovery pass. `x`/`y` is the top-left
/// corner in the absolute pixel space shared by all displays.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DisplayRecord {
    /// Display name (e.g. `\\.\DISPLAY1`), also used by the capture backend
    pub name: String,

    /// Left edge in absolute pixels
    pub x: i32,
    /// Top edge in absolute pixels
    pub y: i32,

    /// Reported width in pixels (0 when unknown)
    #[serde(default)]
    pub width: u32,
    /// Reported height in pixels (0 when unknown)
    #[serde(default)]
    pub height: u32,
}

impl DisplayRecord {
    /// Create a record with unknown pixel size
    pub fn new(name: impl Into<String>, x: i32, y: i32) -> Self {
        Self {
            name: name.into(),
            x,
            y,
            width: 0,
            height: 0,
        }
    }

    /// Attach the reported pixel size
    pub fn with_size(mut self, width: u32, height: u32) -> Self {
        self.width = width;
        self.height = height;
        self
    }
}

impl fmt::Display for DisplayRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} at ({}, {})", self.name, self.x, self.y)?;
        if self.width > 0 && self.height > 0 {
            write!(f, " {}x{}", self.width, self.height)?;
        }
        Ok(())
    }
}

/// Parses `NAME:X:Y` or `NAME:X:Y:WxH`
///
/// The name may itself contain colons; coordinates are taken from the right.
impl FromStr for DisplayRecord {
    type Err = MonitorError;

    fn from_str(s: &str) -> Result<Self> {
        let invalid = || MonitorError::InvalidDisplay(s.to_string());
        let mut parts: Vec<&str> = s.split(':').collect();

        let size = match parts.last() {
            Some(last) if parts.len() >= 4 && last.contains('x') => {
                let (w, h) = last.split_once('x').ok_or_else(invalid)?;
                let size = (
                    w.trim().parse::<u32>().map_err(|_| invalid())?,
                    h.trim().parse::<u32>().map_err(|_| invalid())?,
                );
                parts.pop();
                Some(size)
            }
            _ => None,
        };

        if parts.len() < 3 {
            return Err(invalid());
        }

        let y = parts.pop().ok_or_else(invalid)?.trim().parse::<i32>().map_err(|_| invalid())?;
        let x = parts.pop().ok_or_else(invalid)?.trim().parse::<i32>().map_err(|_| invalid())?;
        let name = parts.join(":");
        if name.is_empty() {
            return Err(invalid());
        }

        let record = DisplayRecord::new(name, x, y);
        Ok(match size {
            Some((w, h)) => record.with_size(w, h),
            None => record,
        })
    }
}

/// Source of the current physical display list
///
/// Implementations are expected to be slow (the Windows API wrapper the
/// layout was first built against costs several frames per call), so callers
/// must only invoke this on activation or an explicit re-scan. The returned
/// order carries no meaning.
#[cfg_attr(test, mockall::automock)]
pub trait DisplayEnumerator {
    /// List the currently attached displays. May be empty.
    fn list_displays(&self) -> Result<Vec<DisplayRecord>>;
}

/// Enumerator backed by a fixed list (configuration or command line)
#[derive(Debug, Clone, Default)]
pub struct StaticEnumerator {
    displays: Vec<DisplayRecord>,
}

impl StaticEnumerator {
    /// Create from a list of records
    pub fn new(displays: Vec<DisplayRecord>) -> Self {
        Self { displays }
    }
}

impl DisplayEnumerator for StaticEnumerator {
    fn list_displays(&self) -> Result<Vec<DisplayRecord>> {
        debug!("Static enumerator returning {} displays", self.displays.len());
        Ok(self.displays.clone())
    }
}

/// The OS enumerator for this build target, if there is one
pub fn platform_enumerator() -> Option<Box<dyn DisplayEnumerator>> {
    #[cfg(windows)]
    {
        Some(Box::new(gdi::GdiEnumerator))
    }

    #[cfg(not(windows))]
    {
        None
    }
}

#[cfg(windows)]
#[allow(unsafe_code)]
mod gdi {
    //! `EnumDisplayMonitors` based enumeration.

    use super::{DisplayEnumerator, DisplayRecord};
    use crate::multimon::{MonitorError, Result};
    use tracing::trace;
    use windows::Win32::Foundation::{BOOL, LPARAM, RECT, TRUE};
    use windows::Win32::Graphics::Gdi::{
        EnumDisplayMonitors, GetMonitorInfoW, HDC, HMONITOR, MONITORINFO, MONITORINFOEXW,
    };

    pub(super) struct GdiEnumerator;

    unsafe extern "system" fn collect_monitor(
        hmonitor: HMONITOR,
        _hdc: HDC,
        _clip: *mut RECT,
        lparam: LPARAM,
    ) -> BOOL {
        let records = unsafe { &mut *(lparam.0 as *mut Vec<DisplayRecord>) };

        let mut info = MONITORINFOEXW::default();
        info.monitorInfo.cbSize = std::mem::size_of::<MONITORINFOEXW>() as u32;

        let ok = unsafe {
            GetMonitorInfoW(hmonitor, &mut info as *mut MONITORINFOEXW as *mut MONITORINFO)
        };
        if ok.as_bool() {
            let len = info
                .szDevice
                .iter()
                .position(|&c| c == 0)
                .unwrap_or(info.szDevice.len());
            let name = String::from_utf16_lossy(&info.szDevice[..len]);
            let rect = info.monitorInfo.rcMonitor;

            trace!("Enumerated monitor {} rect={:?}", name, rect);
            records.push(
                DisplayRecord::new(name, rect.left, rect.top).with_size(
                    (rect.right - rect.left).max(0) as u32,
                    (rect.bottom - rect.top).max(0) as u32,
                ),
            );
        }

        TRUE
    }

    impl DisplayEnumerator for GdiEnumerator {
        fn list_displays(&self) -> Result<Vec<DisplayRecord>> {
            let mut records: Vec<DisplayRecord> = Vec::new();

            let ok = unsafe {
                EnumDisplayMonitors(
                    HDC::default(),
                    None,
                    Some(collect_monitor),
                    LPARAM(&mut records as *mut Vec<DisplayRecord> as isize),
                )
            };
            if !ok.as_bool() {
                return Err(MonitorError::Enumeration(
                    "EnumDisplayMonitors failed".to_string(),
                ));
            }

            Ok(records)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_display_without_size() {
        let record: DisplayRecord = "DISPLAY1:1920:-200".parse().unwrap();
        assert_eq!(record, DisplayRecord::new("DISPLAY1", 1920, -200));
        assert_eq!(record.width, 0);
    }

    #[test]
    fn test_parse_display_with_size() {
        let record: DisplayRecord = "DISPLAY2:0:0:2560x1440".parse().unwrap();
        assert_eq!(record.name, "DISPLAY2");
        assert_eq!((record.width, record.height), (2560, 1440));
    }

    #[test]
    fn test_parse_display_name_with_colons() {
        let record: DisplayRecord = r"\\.\DISPLAY1:odd:name:-1920:0".parse().unwrap();
        assert_eq!(record.name, r"\\.\DISPLAY1:odd:name");
        assert_eq!((record.x, record.y), (-1920, 0));
    }

    #[test]
    fn test_parse_display_rejects_garbage() {
        assert!("DISPLAY1".parse::<DisplayRecord>().is_err());
        assert!("DISPLAY1:a:b".parse::<DisplayRecord>().is_err());
        assert!(":0:0".parse::<DisplayRecord>().is_err());
        assert!("D:0:0:axb".parse::<DisplayRecord>().is_err());
    }

    #[test]
    fn test_static_enumerator_returns_configured_list() {
        let displays = vec![
            DisplayRecord::new("A", 0, 0),
            DisplayRecord::new("B", 1920, 0),
        ];
        let enumerator = StaticEnumerator::new(displays.clone());
        assert_eq!(enumerator.list_displays().unwrap(), displays);
    }

    #[test]
    fn test_display_record_format() {
        let record = DisplayRecord::new("DISPLAY1", 0, 1080).with_size(1920, 1080);
        assert_eq!(record.to_string(), "DISPLAY1 at (0, 1080) 1920x1080");
    }
}
