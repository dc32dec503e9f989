// Tabulated interpolation helpers shared by the cross-section lookups.

/// Linear-linear interpolation of `y(x_new)` over a sorted grid.
///
/// Outside the grid the first/last y value is returned; callers that need a
/// zero extrapolation below threshold must clamp before calling.
pub fn interpolate_linear(x: &[f64], y: &[f64], x_new: f64) -> f64 {
    if x.is_empty() {
        return f64::NAN;
    }
    if x.len() == 1 {
        return y[0];
    }
    if x_new <= x[0] {
        return y[0];
    }
    if x_new >= x[x.len() - 1] {
        return y[y.len() - 1];
    }

    let idx = lower_index(x, x_new);
    let (x1, x2) = (x[idx], x[idx + 1]);
    let (y1, y2) = (y[idx], y[idx + 1]);
    y1 + (x_new - x1) * (y2 - y1) / (x2 - x1)
}

/// Log-log interpolation of `y(x_new)` over a sorted grid. All x and y values
/// must be positive; used for the smooth photoatomic cross sections.
pub fn interpolate_log_log(x: &[f64], y: &[f64], x_new: f64) -> f64 {
    if x.is_empty() {
        return f64::NAN;
    }
    if x.len() == 1 {
        return y[0];
    }
    if x_new <= x[0] {
        return y[0];
    }
    if x_new >= x[x.len() - 1] {
        return y[y.len() - 1];
    }

    let idx = lower_index(x, x_new);
    let (x1, x2) = (x[idx], x[idx + 1]);
    let (y1, y2) = (y[idx], y[idx + 1]);
    if y1 <= 0.0 || y2 <= 0.0 {
        // Zero endpoints have no log representation; fall back to lin-lin.
        return y1 + (x_new - x1) * (y2 - y1) / (x2 - x1);
    }
    let slope = (y2.ln() - y1.ln()) / (x2.ln() - x1.ln());
    (y1.ln() + (x_new.ln() - x1.ln()) * slope).exp()
}

/// Largest index i with x[i] <= x_new < x[i+1], assuming x_new is interior.
#[inline]
fn lower_index(x: &[f64], x_new: f64) -> usize {
    let mut low = 0usize;
    let mut high = x.len() - 1;
    while high - low > 1 {
        let mid = (low + high) >> 1;
        if x[mid] <= x_new {
            low = mid;
        } else {
            high = mid;
        }
    }
    low
}
