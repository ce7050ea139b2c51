/// Renders a measurement so the text quotes the recorded value: integral values get
/// one decimal (`22.0`), others keep their shortest exact form (`21.8`, `87.3`).
pub fn fmt_num(v: f64) -> String {
    if v.is_finite() && v.fract() == 0.0 && v.abs() < 1e15 {
        format!("{v:.1}")
    } else {
        format!("{v}")
    }
}
