//! User-Friendly Error Formatting
//!
//! Turns a fatal `anyhow::Error` into a boxed message with likely causes
//! and what to try next.

use std::fmt::Write;

use crate::multimon::MonitorError;

/// Format error for user consumption
///
/// Downcasts to [`MonitorError`] or [`DriverError`](crate::driver::DriverError)
/// where possible and falls back to matching on the message text.
pub fn format_user_error(error: &anyhow::Error) -> String {
    let mut output = String::new();

    writeln!(&mut output).ok();
    writeln!(
        &mut output,
        "╔════════════════════════════════════════════════════════════╗"
    )
    .ok();
    writeln!(
        &mut output,
        "║                     ERROR                                  ║"
    )
    .ok();
    writeln!(
        &mut output,
        "╚════════════════════════════════════════════════════════════╝"
    )
    .ok();
    writeln!(&mut output).ok();

    let error_msg = error.to_string();

    match classify(error) {
        Category::Config => format_config_error(&mut output),
        Category::Display => format_display_error(&mut output),
        Category::Driver => format_driver_error(&mut output),
        Category::Backend => format_backend_error(&mut output),
        Category::Generic => format_generic_error(&mut output, &error_msg),
    }

    writeln!(&mut output).ok();
    writeln!(
        &mut output,
        "━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━"
    )
    .ok();
    writeln!(&mut output, "Technical Details:").ok();
    writeln!(&mut output).ok();
    writeln!(&mut output, "{:#}", error).ok();
    writeln!(&mut output).ok();

    writeln!(
        &mut output,
        "━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━"
    )
    .ok();
    writeln!(&mut output, "Need Help?").ok();
    writeln!(
        &mut output,
        "  - Run with --verbose for detailed logs: virtual-monitors -vvv"
    )
    .ok();
    writeln!(
        &mut output,
        "  - Write logs to a file: virtual-monitors --log-file monitors.log"
    )
    .ok();
    writeln!(
        &mut output,
        "╚════════════════════════════════════════════════════════════╝"
    )
    .ok();

    output
}

#[derive(Debug, PartialEq, Eq)]
enum Category {
    Config,
    Display,
    Driver,
    Backend,
    Generic,
}

fn classify(error: &anyhow::Error) -> Category {
    for cause in error.chain() {
        if let Some(monitor) = cause.downcast_ref::<MonitorError>() {
            return match monitor {
                MonitorError::InvalidConfiguration(_) => Category::Config,
                MonitorError::Enumeration(_) | MonitorError::InvalidDisplay(_) => {
                    Category::Display
                }
                MonitorError::Backend(_) | MonitorError::NotActive => Category::Backend,
            };
        }
        if cause.downcast_ref::<crate::driver::DriverError>().is_some() {
            return Category::Driver;
        }
    }

    let error_msg = error.to_string().to_lowercase();
    if error_msg.contains("config") || error_msg.contains("toml") {
        Category::Config
    } else if error_msg.contains("driver") {
        Category::Driver
    } else if error_msg.contains("display") {
        Category::Display
    } else {
        Category::Generic
    }
}

fn format_config_error(output: &mut String) {
    writeln!(output, "Configuration Error").ok();
    writeln!(output).ok();
    writeln!(output, "Problem with the configuration file or flags.").ok();
    writeln!(output).ok();
    writeln!(output, "Common Causes:").ok();
    writeln!(output).ok();
    writeln!(output, "  1. Invalid TOML syntax").ok();
    writeln!(output, "     → Check for typos, missing quotes, etc.").ok();
    writeln!(output).ok();
    writeln!(output, "  2. Out-of-range placement values").ok();
    writeln!(
        output,
        "     → placement.scale_per_thousand_pixels must be > 0"
    )
    .ok();
    writeln!(
        output,
        "     → placement.height_offset and depth_offset must be >= 0"
    )
    .ok();
    writeln!(output).ok();
    writeln!(output, "  3. Inconsistent slot or discovery settings").ok();
    writeln!(output, "     → slots.mode = 'fixed' needs a count").ok();
    writeln!(
        output,
        "     → discovery.source = 'static' needs [[discovery.displays]]"
    )
    .ok();
}

fn format_display_error(output: &mut String) {
    writeln!(output, "Display Discovery Error").ok();
    writeln!(output).ok();
    writeln!(output, "Could not work out the physical display layout.").ok();
    writeln!(output).ok();
    writeln!(output, "Common Causes:").ok();
    writeln!(output).ok();
    writeln!(output, "  1. Malformed --static-display value").ok();
    writeln!(output, "     → Format: NAME:X:Y or NAME:X:Y:WIDTHxHEIGHT").ok();
    writeln!(
        output,
        "     → Example: --static-display DISPLAY2:1920:0:2560x1440"
    )
    .ok();
    writeln!(output).ok();
    writeln!(output, "  2. OS enumeration unavailable on this platform").ok();
    writeln!(
        output,
        "     → Set discovery.source = 'static' and list displays"
    )
    .ok();
}

fn format_driver_error(output: &mut String) {
    writeln!(output, "Virtual Display Driver Error").ok();
    writeln!(output).ok();
    writeln!(output, "The virtual display driver command did not succeed.").ok();
    writeln!(output).ok();
    writeln!(output, "Common Causes:").ok();
    writeln!(output).ok();
    writeln!(output, "  1. Command not found").ok();
    writeln!(
        output,
        "     → Check driver.add_command and driver.remove_command"
    )
    .ok();
    writeln!(output).ok();
    writeln!(output, "  2. Driver not installed or needs elevation").ok();
    writeln!(output, "     → Run the command by hand to see its output").ok();
    writeln!(output).ok();
    writeln!(output, "  3. Driver not wanted").ok();
    writeln!(output, "     → Set driver.enabled = false").ok();
}

fn format_backend_error(output: &mut String) {
    writeln!(output, "Scene Backend Error").ok();
    writeln!(output).ok();
    writeln!(output, "A screen object could not be created or driven.").ok();
    writeln!(output).ok();
    writeln!(output, "Troubleshooting:").ok();
    writeln!(output).ok();
    writeln!(
        output,
        "  1. Lower slots.count if the backend limits object count"
    )
    .ok();
    writeln!(output, "  2. Re-run with -vv to see per-slot lifecycle logs").ok();
}

fn format_generic_error(output: &mut String, error: &str) {
    writeln!(output, "Runtime Error").ok();
    writeln!(output).ok();
    writeln!(output, "An error occurred while running the monitor loop.").ok();
    writeln!(output).ok();
    writeln!(output, "Error: {}", error).ok();
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_error_formatting() {
        let error = anyhow::Error::new(MonitorError::InvalidConfiguration(
            "scale must be > 0".to_string(),
        ));
        let formatted = format_user_error(&error);
        assert!(formatted.contains("ERROR"));
        assert!(formatted.contains("Configuration Error"));
        assert!(formatted.contains("scale must be > 0"));
    }

    #[test]
    fn test_classify_through_context() {
        let error = anyhow::Error::new(MonitorError::InvalidDisplay("bad".to_string()))
            .context("Failed to parse command line");
        assert_eq!(classify(&error), Category::Display);
    }

    #[test]
    fn test_driver_error_formatting() {
        let error = anyhow::Error::new(crate::driver::DriverError::NotConfigured);
        assert_eq!(classify(&error), Category::Driver);
        assert!(format_user_error(&error).contains("driver.add_command"));
    }

    #[test]
    fn test_message_fallback() {
        let error = anyhow::anyhow!("Failed to parse TOML");
        assert_eq!(classify(&error), Category::Config);

        let error = anyhow::anyhow!("something else");
        assert_eq!(classify(&error), Category::Generic);
    }
}
