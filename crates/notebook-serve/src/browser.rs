//! Default-browser launching.

/// Open `url` in the default browser.
///
/// Failures are deliberately ignored: the caller always prints the URL, so
/// a browser that refuses to open costs the user one copy-paste.
pub fn open_browser(url: &str) {
    let _ = if cfg!(target_os = "macos") {
        std::process::Command::new("open").arg(url).spawn()
    } else if cfg!(target_os = "windows") {
        std::process::Command::new("cmd").args(["/C", "start", url]).spawn()
    } else {
        std::process::Command::new("xdg-open").arg(url).spawn()
    };
}
