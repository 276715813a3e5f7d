// Pure layout math shared by the DOM helpers. No web-sys here so the host
// tests can include this file directly.

/// Parse a CSS `rootMargin` ("50px 0px", "-30% 0px -30% 0px") into
/// (top, bottom) pixels. Percentages are of `viewport_height`. Unparseable
/// parts count as 0.
pub fn parse_root_margin(margin: &str, viewport_height: f64) -> (f64, f64) {
    let parts: Vec<f64> = margin
        .split_whitespace()
        .map(|p| parse_length(p, viewport_height))
        .collect();
    match parts.as_slice() {
        [] => (0.0, 0.0),
        [all] => (*all, *all),
        [vertical, _] => (*vertical, *vertical),
        [top, _, bottom, ..] => (*top, *bottom),
    }
}

fn parse_length(s: &str, reference: f64) -> f64 {
    let v = if let Some(pct) = s.strip_suffix('%') {
        pct.parse::<f64>().map(|p| p / 100.0 * reference)
    } else {
        s.trim_end_matches("px").parse::<f64>()
    };
    v.ok().filter(|x| x.is_finite()).unwrap_or(0.0)
}

/// Fraction of an element (top and height in viewport coordinates) that lies
/// inside the root box. Positive margins grow the root, negative shrink it.
pub fn visible_fraction(
    el_top: f64,
    el_height: f64,
    viewport_height: f64,
    margin: (f64, f64),
) -> f64 {
    let root_top = -margin.0;
    let root_bottom = viewport_height + margin.1;
    if !root_bottom.is_finite() || root_bottom <= root_top || !el_top.is_finite() || !el_height.is_finite() {
        return 0.0;
    }
    let el_bottom = el_top + el_height.max(0.0);
    if el_height <= 0.0 {
        return if el_top >= root_top && el_top <= root_bottom {
            1.0
        } else {
            0.0
        };
    }
    let overlap = el_bottom.min(root_bottom) - el_top.max(root_top);
    (overlap / el_height).clamp(0.0, 1.0)
}

pub fn translate_y_css(offset_px: f64) -> String {
    format!("translate3d(0, {}px, 0)", round_px(offset_px))
}

pub fn translate_x_css(offset_px: f64) -> String {
    format!("translate3d({}px, 0, 0)", round_px(offset_px))
}

// Two decimals is plenty for sub-pixel transforms and keeps style strings short.
fn round_px(v: f64) -> f64 {
    let r = if v.is_finite() {
        (v * 100.0).round() / 100.0
    } else {
        0.0
    };
    // Avoid printing "-0".
    if r == 0.0 {
        0.0
    } else {
        r
    }
}
