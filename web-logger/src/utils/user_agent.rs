/// 从 User-Agent 推导设备描述 `{浏览器} ({系统})`
///
/// 判断顺序有意义: Chrome 的UA同时包含 `Safari`,
/// Edge 的UA同时包含 `Chrome`。无法识别的部分为 `Unknown`。
pub fn describe_device(user_agent: &str) -> String {
    let ua = user_agent;

    let browser = if ua.contains("Chrome") && !ua.contains("Edg") {
        "Chrome"
    } else if ua.contains("Safari") && !ua.contains("Chrome") {
        "Safari"
    } else if ua.contains("Firefox") {
        "Firefox"
    } else if ua.contains("Edg") {
        "Edge"
    } else {
        "Unknown"
    };

    let os = if ua.contains("iPhone") {
        "iPhone"
    } else if ua.contains("iPad") {
        "iPad"
    } else if ua.contains("Android") {
        "Android"
    } else if ua.contains("Windows") {
        "Windows"
    } else if ua.contains("Mac") {
        "macOS"
    } else if ua.contains("Linux") {
        "Linux"
    } else {
        "Unknown"
    };

    format!("{} ({})", browser, os)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_chrome_on_windows() {
        let ua = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/120.0.0.0 Safari/537.36";
        assert_eq!(describe_device(ua), "Chrome (Windows)");
    }

    #[test]
    fn test_edge_is_not_chrome() {
        let ua = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/120.0.0.0 Safari/537.36 Edg/120.0.0.0";
        assert_eq!(describe_device(ua), "Edge (Windows)");
    }

    #[test]
    fn test_safari_on_iphone() {
        let ua = "Mozilla/5.0 (iPhone; CPU iPhone OS 17_0 like Mac OS X) AppleWebKit/605.1.15 (KHTML, like Gecko) Version/17.0 Mobile/15E148 Safari/604.1";
        assert_eq!(describe_device(ua), "Safari (iPhone)");
    }

    #[test]
    fn test_firefox_on_linux() {
        let ua = "Mozilla/5.0 (X11; Linux x86_64; rv:121.0) Gecko/20100101 Firefox/121.0";
        assert_eq!(describe_device(ua), "Firefox (Linux)");
    }

    #[test]
    fn test_unknown() {
        assert_eq!(describe_device(""), "Unknown (Unknown)");
    }
}
