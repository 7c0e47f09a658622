/// Millimetres per CSS pixel at 96 dpi.
const MM_PER_PX: f64 = 0.264583;

/// Parses a wkhtmltopdf size string (`10mm`, `2cm`, `1in`, `20px` or a
/// bare number) into millimetres.
pub fn parse_size(size: &str) -> Option<f64> {

    let size = size.trim().to_lowercase();
    if size.is_empty() {
        return None;
    }

    let (number, factor) = if let Some(n) = size.strip_suffix("mm") {
        (n, 1.0)
    } else if let Some(n) = size.strip_suffix("cm") {
        (n, 10.0)
    } else if let Some(n) = size.strip_suffix("in") {
        (n, 25.4)
    } else if let Some(n) = size.strip_suffix("px") {
        (n, MM_PER_PX)
    } else {
        (size.as_str(), 1.0)
    };

    number.trim().parse::<f64>().ok()
        .filter(|n| n.is_finite())
        .map(|n| n * factor)
}

pub fn mm_to_inches(mm: f64) -> f64 {
    mm / 25.4
}

/// Parses a `WIDTHxHEIGHT` viewport string.
pub fn parse_viewport(viewport: &str) -> Option<(u32, u32)> {
    let (w, h) = viewport.trim().to_lowercase().split_once('x')
        .map(|(w, h)| (w.trim().to_string(), h.trim().to_string()))?;
    Some((w.parse().ok()?, h.parse().ok()?))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn close(a: f64, b: f64) -> bool {
        (a - b).abs() < 1e-9
    }

    #[test]
    fn test_units() {
        assert!(close(parse_size("10mm").unwrap(), 10.0));
        assert!(close(parse_size("2cm").unwrap(), 20.0));
        assert!(close(parse_size("1in").unwrap(), 25.4));
        assert!(close(parse_size("100px").unwrap(), 26.4583));
        assert!(close(parse_size(" 12.5 ").unwrap(), 12.5));
        assert!(close(parse_size("5MM").unwrap(), 5.0));
    }

    #[test]
    fn test_bad_sizes() {
        assert_eq!(parse_size(""), None);
        assert_eq!(parse_size("   "), None);
        assert_eq!(parse_size("abc"), None);
        assert_eq!(parse_size("10pt"), None);
        assert_eq!(parse_size("mm"), None);
    }

    #[test]
    fn test_inches() {
        assert!(close(mm_to_inches(25.4), 1.0));
        assert!(close(mm_to_inches(0.0), 0.0));
    }

    #[test]
    fn test_viewport() {
        assert_eq!(parse_viewport("1024x768"), Some((1024, 768)));
        assert_eq!(parse_viewport("800X600"), Some((800, 600)));
        assert_eq!(parse_viewport("1024"), None);
        assert_eq!(parse_viewport("axb"), None);
    }
}
