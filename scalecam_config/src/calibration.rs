//! Load-cell calibration: persisted form and the `raw,grams` CSV fit.
//!
//! The fit is ordinary least squares over all rows, followed by one refit
//! over the rows whose residual is within 2 RMS of the first line.
//! grams = scale_factor * (raw - zero_counts)

use serde::Deserialize;

/// Calibration CSV schema.
///
/// Expected headers:
/// raw,grams
#[derive(Debug, Deserialize, Clone, Copy)]
pub struct CalibrationRow {
    pub raw: i64,
    pub grams: f32,
}

#[derive(Debug, Deserialize, Clone, Copy, PartialEq)]
pub struct LoadCellCalibration {
    /// grams per raw count
    pub scale_factor: f32,
    /// raw reading with nothing on the platform
    pub zero_counts: i32,
}

const OUTLIER_K: f64 = 2.0;

impl LoadCellCalibration {
    pub fn from_rows(rows: &[CalibrationRow]) -> eyre::Result<Self> {
        if rows.len() < 2 {
            eyre::bail!("calibration requires at least two rows, got {}", rows.len());
        }
        check_monotonic(rows)?;

        let pts: Vec<(f64, f64)> = rows
            .iter()
            .map(|r| (r.raw as f64, f64::from(r.grams)))
            .collect();
        let (a0, b0) = ols(&pts)?;

        let rms = {
            let ss: f64 = pts
                .iter()
                .map(|(x, y)| (y - (a0 * x + b0)).powi(2))
                .sum();
            (ss / pts.len() as f64).sqrt()
        };

        let (a, b) = if rms.is_finite() && rms > 0.0 {
            let inliers: Vec<(f64, f64)> = pts
                .iter()
                .copied()
                .filter(|(x, y)| (y - (a0 * x + b0)).abs() <= OUTLIER_K * rms)
                .collect();
            if inliers.len() >= 2 && inliers.len() < pts.len() {
                ols(&inliers).unwrap_or((a0, b0))
            } else {
                (a0, b0)
            }
        } else {
            (a0, b0)
        };

        let zero = -b / a;
        if !zero.is_finite() || zero.abs() > f64::from(i32::MAX) {
            eyre::bail!("calibration produced invalid tare baseline");
        }
        let scale_factor = a as f32;
        if !scale_factor.is_finite() || scale_factor == 0.0 {
            eyre::bail!("calibration produced zero or non-finite slope");
        }
        Ok(Self {
            scale_factor,
            zero_counts: zero.round() as i32,
        })
    }
}

fn check_monotonic(rows: &[CalibrationRow]) -> eyre::Result<()> {
    let mut dir = 0i8;
    for (i, w) in rows.windows(2).enumerate() {
        let step = match w[1].raw.cmp(&w[0].raw) {
            std::cmp::Ordering::Equal => eyre::bail!(
                "calibration rows have duplicate raw values at index {} and {}",
                i,
                i + 1
            ),
            std::cmp::Ordering::Greater => 1,
            std::cmp::Ordering::Less => -1,
        };
        if dir != 0 && dir != step {
            eyre::bail!(
                "calibration raw values must be monotonic (strictly increasing or strictly decreasing)"
            );
        }
        dir = step;
    }
    Ok(())
}

/// Slope and intercept of y = a*x + b.
fn ols(pts: &[(f64, f64)]) -> eyre::Result<(f64, f64)> {
    let n = pts.len() as f64;
    let mean_x = pts.iter().map(|p| p.0).sum::<f64>() / n;
    let mean_y = pts.iter().map(|p| p.1).sum::<f64>() / n;
    let (sxx, sxy) = pts.iter().fold((0.0, 0.0), |(sxx, sxy), (x, y)| {
        let dx = x - mean_x;
        (sxx + dx * dx, sxy + dx * (y - mean_y))
    });
    if !sxx.is_finite() || sxx == 0.0 {
        eyre::bail!("calibration cannot determine slope (degenerate raw spread)");
    }
    let a = sxy / sxx;
    if !a.is_finite() || a == 0.0 {
        eyre::bail!("calibration produced zero or non-finite slope");
    }
    Ok((a, mean_y - a * mean_x))
}

pub fn load_calibration_csv(path: &std::path::Path) -> eyre::Result<LoadCellCalibration> {
    let mut rdr = csv::ReaderBuilder::new()
        .has_headers(true)
        .trim(csv::Trim::All)
        .from_path(path)
        .map_err(|e| eyre::eyre!("open calibration CSV {}: {e}", path.display()))?;

    let headers = rdr
        .headers()
        .map_err(|e| eyre::eyre!("read CSV headers {}: {e}", path.display()))?;
    if headers.iter().collect::<Vec<_>>() != ["raw", "grams"] {
        eyre::bail!(
            "calibration CSV must have headers 'raw,grams', got: {}",
            headers.iter().collect::<Vec<_>>().join(",")
        );
    }

    let mut rows = Vec::new();
    for (idx, rec) in rdr.deserialize::<CalibrationRow>().enumerate() {
        match rec {
            Ok(row) => rows.push(row),
            Err(e) => eyre::bail!("invalid CSV row {}: {e}", idx + 2),
        }
    }
    LoadCellCalibration::from_rows(&rows)
}
