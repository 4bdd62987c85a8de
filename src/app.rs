use crate::cluster::Cluster;
use crate::error::DlaError;
use crate::fractal::{self, EstimationMethod, FitResult};

/// Viewer state for inspecting a cluster and its dimension fit
pub struct App {
    pub cluster: Cluster,
    /// Label shown in the status box (usually the file name)
    pub source: String,
    pub method: EstimationMethod,
    /// Latest fit, or the reason it failed
    pub fit: Result<FitResult, DlaError>,
    pub fullscreen_mode: bool,
    pub show_help: bool,
    box_sizes: Vec<usize>,
    radii: Vec<usize>,
}

impl App {
    pub fn new(
        cluster: Cluster,
        source: impl Into<String>,
        method: EstimationMethod,
        box_sizes: Vec<usize>,
        radii: Vec<usize>,
    ) -> Self {
        let mut app = Self {
            cluster,
            source: source.into(),
            method,
            fit: Err(DlaError::InsufficientData("not fitted yet".to_string())),
            fullscreen_mode: false,
            show_help: false,
            box_sizes,
            radii,
        };
        app.refit();
        app
    }

    /// Scales used by the current method
    pub fn scales(&self) -> &[usize] {
        match self.method {
            EstimationMethod::BoxCounting => &self.box_sizes,
            EstimationMethod::MassRadius => &self.radii,
        }
    }

    /// Recompute the fit for the current method
    pub fn refit(&mut self) {
        let result = match self.method {
            EstimationMethod::BoxCounting => fractal::estimate(&self.cluster, &self.box_sizes),
            EstimationMethod::MassRadius => fractal::estimate_mass_radius(&self.cluster, &self.radii),
        };
        if let Err(ref e) = result {
            tracing::debug!(method = self.method.name(), error = %e, "Dimension fit failed");
        }
        self.fit = result;
    }

    /// Switch between box counting and mass-radius and refit
    pub fn toggle_method(&mut self) {
        self.method = match self.method {
            EstimationMethod::BoxCounting => EstimationMethod::MassRadius,
            EstimationMethod::MassRadius => EstimationMethod::BoxCounting,
        };
        self.refit();
    }

    pub fn toggle_fullscreen(&mut self) {
        self.fullscreen_mode = !self.fullscreen_mode;
    }

    pub fn toggle_help(&mut self) {
        self.show_help = !self.show_help;
    }
}
