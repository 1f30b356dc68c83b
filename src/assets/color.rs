use crate::foundation::core::Rgba8;

/// Parse a CSS color string as used by the host documents.
///
/// Accepts `#rgb`, `#rgba`, `#rrggbb`, `#rrggbbaa`, `rgb(r, g, b)`, `rgba(r, g, b, a)` (alpha in
/// `0..=1`) and a handful of named colors.
pub(crate) fn parse_color(s: &str) -> Result<Rgba8, String> {
    let s = s.trim().to_ascii_lowercase();
    if let Some(hex) = s.strip_prefix('#') {
        return parse_hex(hex);
    }
    if let Some(body) = s
        .strip_prefix("rgba(")
        .or_else(|| s.strip_prefix("rgb("))
        .and_then(|rest| rest.strip_suffix(')'))
    {
        return parse_rgb_fn(body);
    }
    named(&s).ok_or_else(|| format!("unsupported color \"{s}\""))
}

fn parse_hex(hex: &str) -> Result<Rgba8, String> {
    fn nibble(c: u8) -> Result<u8, String> {
        (c as char)
            .to_digit(16)
            .map(|d| d as u8)
            .ok_or_else(|| format!("invalid hex digit '{}'", c as char))
    }

    let b = hex.as_bytes();
    let digits = b.iter().map(|&c| nibble(c)).collect::<Result<Vec<u8>, String>>()?;
    match digits.len() {
        3 | 4 => {
            let ch = |i: usize| digits[i] * 17;
            Ok(Rgba8 {
                r: ch(0),
                g: ch(1),
                b: ch(2),
                a: if digits.len() == 4 { ch(3) } else { 255 },
            })
        }
        6 | 8 => {
            let ch = |i: usize| (digits[i * 2] << 4) | digits[i * 2 + 1];
            Ok(Rgba8 {
                r: ch(0),
                g: ch(1),
                b: ch(2),
                a: if digits.len() == 8 { ch(3) } else { 255 },
            })
        }
        _ => Err("hex color must be #rgb, #rgba, #rrggbb or #rrggbbaa".to_owned()),
    }
}

fn parse_rgb_fn(body: &str) -> Result<Rgba8, String> {
    let parts: Vec<&str> = body.split(',').map(str::trim).collect();
    if parts.len() != 3 && parts.len() != 4 {
        return Err(format!("rgb()/rgba() expects 3 or 4 components, got {}", parts.len()));
    }
    let channel = |p: &str| -> Result<u8, String> {
        let v = p
            .parse::<f64>()
            .map_err(|_| format!("invalid color channel \"{p}\""))?;
        Ok(v.round().clamp(0.0, 255.0) as u8)
    };
    let alpha = match parts.get(3) {
        Some(p) => {
            let v = p
                .parse::<f64>()
                .map_err(|_| format!("invalid alpha \"{p}\""))?;
            (v.clamp(0.0, 1.0) * 255.0).round() as u8
        }
        None => 255,
    };
    Ok(Rgba8 {
        r: channel(parts[0])?,
        g: channel(parts[1])?,
        b: channel(parts[2])?,
        a: alpha,
    })
}

fn named(name: &str) -> Option<Rgba8> {
    let c = match name {
        "transparent" => Rgba8::transparent(),
        "black" => Rgba8::rgb(0, 0, 0),
        "white" => Rgba8::rgb(255, 255, 255),
        "red" => Rgba8::rgb(255, 0, 0),
        "green" => Rgba8::rgb(0, 128, 0),
        "lime" => Rgba8::rgb(0, 255, 0),
        "blue" => Rgba8::rgb(0, 0, 255),
        "yellow" => Rgba8::rgb(255, 255, 0),
        "cyan" | "aqua" => Rgba8::rgb(0, 255, 255),
        "magenta" | "fuchsia" => Rgba8::rgb(255, 0, 255),
        "gray" | "grey" => Rgba8::rgb(128, 128, 128),
        "orange" => Rgba8::rgb(255, 165, 0),
        _ => return None,
    };
    Some(c)
}
