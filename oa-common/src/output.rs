//! Output JSON formatting for propagation runs

use crate::array::Receiver;
use crate::config::EnvironmentParameters;
use crate::types::normalize_pressure;
use ndarray::Array2;
use num_complex::Complex64;
use serde::{Deserialize, Serialize};

/// Transmission-loss style summary of a computed pressure field
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FieldResult {
    /// Model that produced the field
    pub model: String,
    /// Run title
    pub title: String,
    /// Frequency [Hz]
    pub frequency: f64,
    /// Receiver depths [m]
    pub depths: Vec<f64>,
    /// Receiver ranges [km]
    pub ranges: Vec<f64>,
    /// Normalized magnitude in dB, shape (depths, ranges)
    pub level_db: Array2<f64>,
    /// Generation timestamp
    pub date: String,
}

impl FieldResult {
    /// Summarize a (depth, range) field computed on a receiver array
    pub fn new(
        model: &str,
        title: &str,
        frequency: f64,
        receiver: &Receiver,
        field: &Array2<Complex64>,
    ) -> Self {
        Self {
            model: model.to_string(),
            title: title.to_string(),
            frequency,
            depths: receiver.z.clone(),
            ranges: receiver.r.clone(),
            level_db: normalize_pressure(field, true),
            date: chrono::Local::now().format("%Y-%m-%d %H:%M:%S").to_string(),
        }
    }

    /// JSON document with the level flattened row by row
    pub fn to_json(&self) -> serde_json::Value {
        serde_json::json!({
            "model": self.model,
            "title": self.title,
            "frequency": self.frequency,
            "depths": self.depths,
            "ranges": self.ranges,
            "level_db": self.level_db.iter().cloned().collect::<Vec<f64>>(),
            "shape": [self.depths.len(), self.ranges.len()],
            "metadata": {
                "date": self.date,
                "version": crate::version(),
            },
        })
    }
}

/// Print an environment summary to stdout
pub fn print_environment_summary(title: &str, freq: f64, env: &EnvironmentParameters) {
    println!("\n=== Environment Summary ===");
    println!("Title: {title}");
    println!("Frequency: {freq:.2} Hz");
    println!("Layers: {}", env.layerdata.len());
    for (i, layer) in env.layerdata.iter().enumerate() {
        println!(
            "  - layer {}: {} depths, z_max {:.1} m",
            i + 1,
            layer.z.len(),
            layer.z_max()
        );
    }
    println!("Top option: '{}'", env.top_opt);
    println!("Bottom option: '{}'", env.bot_opt);
    println!("Sources: {:?} m", env.src_z.as_slice());
    println!(
        "Receivers: {} depths, {} ranges",
        env.rec_z.len(),
        env.rec_r.len()
    );
    if let Some(tilt) = env.tilt {
        println!("  Tilt: {tilt:.2} deg");
    }
}
