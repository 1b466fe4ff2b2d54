//! Typed solver configuration read from a settings document, e.g.
//!
//! ```text
//! bisection tolerance: 1e-8 max_iterations: 500
//! newton tolerance: 1e-6 first_derivative_step: 1e-5
//! linear_solver convention: Negated
//! integration rules: Simpson, Trapezoidal tolerance: 1e-7
//! logging loglevel: info
//! ```
//!
//! Sections that are absent keep their defaults, unknown sections or keys are rejected.
use crate::Utils::task_parser::{DocumentMap, Value, parse_document_as};
use crate::numerical::error::NumericalError;
use crate::numerical::integration::{IntegrationConfig, Integrator, PartitionMode, QuadratureRule};
use crate::numerical::optimization::coordinate_descent::{CoordinateDescent, CoordinateDescentConfig};
use crate::numerical::optimization::minimize_scalar::{ScalarSearch, ScalarSearchConfig};
use crate::numerical::optimization::newton_minimizer::{NewtonConfig, NewtonMinimizer};
use crate::somelinalg::dense_solvers::{LinearSolverConfig, LinearSolverMethod, LinearSystemSolver, RhsConvention};
use log::info;
use std::fs;
use std::path::Path;
use std::str::FromStr;
use strum::IntoEnumIterator;

const SECTIONS: [&str; 7] = [
    "bisection",
    "golden_section",
    "newton",
    "coordinate_descent",
    "linear_solver",
    "integration",
    "logging",
];

#[derive(Debug, Clone)]
pub struct IntegrationSettings {
    pub config: IntegrationConfig,
    pub mode: PartitionMode,
    pub rules: Vec<QuadratureRule>,
}

impl Default for IntegrationSettings {
    fn default() -> Self {
        Self {
            config: IntegrationConfig::default(),
            mode: PartitionMode::Automatic { tolerance: 1e-6 },
            rules: QuadratureRule::iter().collect(),
        }
    }
}

#[derive(Debug, Clone)]
pub struct LoggingSettings {
    pub loglevel: String,
    pub log_dir: Option<String>,
}

impl Default for LoggingSettings {
    fn default() -> Self {
        Self {
            loglevel: "info".to_string(),
            log_dir: None,
        }
    }
}

#[derive(Debug, Clone)]
pub struct SolverSettings {
    pub bisection: ScalarSearchConfig,
    pub golden_section: ScalarSearchConfig,
    pub newton: NewtonConfig,
    pub coordinate_descent: CoordinateDescentConfig,
    pub linear_solver: LinearSolverConfig,
    pub linear_methods: Vec<LinearSolverMethod>,
    pub integration: IntegrationSettings,
    pub logging: LoggingSettings,
}

impl Default for SolverSettings {
    fn default() -> Self {
        Self {
            bisection: ScalarSearchConfig::default(),
            golden_section: ScalarSearchConfig::golden_section(),
            newton: NewtonConfig::default(),
            coordinate_descent: CoordinateDescentConfig::default(),
            linear_solver: LinearSolverConfig::default(),
            linear_methods: LinearSolverMethod::iter().collect(),
            integration: IntegrationSettings::default(),
            logging: LoggingSettings::default(),
        }
    }
}

/// single value of a key
fn single<'a>(section: &str, key: &str, values: &'a [Value]) -> Result<&'a Value, NumericalError> {
    match values {
        [value] => Ok(value),
        _ => Err(NumericalError::InvalidInput(format!(
            "{}.{} expects exactly one value, got {}",
            section,
            key,
            values.len()
        ))),
    }
}

fn positive_float(section: &str, key: &str, values: &[Value]) -> Result<f64, NumericalError> {
    let value = single(section, key, values)?;
    match value.as_float() {
        Some(v) if v > 0.0 && v.is_finite() => Ok(v),
        _ => Err(NumericalError::InvalidInput(format!(
            "{}.{} must be a positive number, got {}",
            section, key, value
        ))),
    }
}

fn positive_integer(section: &str, key: &str, values: &[Value]) -> Result<usize, NumericalError> {
    let value = single(section, key, values)?;
    match value.as_integer() {
        Some(v) if v > 0 => Ok(v as usize),
        _ => Err(NumericalError::InvalidInput(format!(
            "{}.{} must be a positive integer, got {}",
            section, key, value
        ))),
    }
}

fn boolean(section: &str, key: &str, values: &[Value]) -> Result<bool, NumericalError> {
    let value = single(section, key, values)?;
    value.as_boolean().ok_or_else(|| {
        NumericalError::InvalidInput(format!("{}.{} must be true or false, got {}", section, key, value))
    })
}

fn text(section: &str, key: &str, values: &[Value]) -> Result<String, NumericalError> {
    Ok(single(section, key, values)?.to_string())
}

/// enum variant by its Display name, case-insensitive
fn variant<E>(section: &str, key: &str, value: &Value) -> Result<E, NumericalError>
where
    E: IntoEnumIterator + std::fmt::Display,
{
    let name = value.to_string();
    E::iter()
        .find(|v| v.to_string().eq_ignore_ascii_case(&name))
        .ok_or_else(|| {
            let allowed: Vec<String> = E::iter().map(|v| v.to_string()).collect();
            NumericalError::InvalidInput(format!(
                "{}.{}: unknown value '{}', expected one of {}",
                section,
                key,
                name,
                allowed.join(", ")
            ))
        })
}

fn unknown_key(section: &str, key: &str) -> NumericalError {
    NumericalError::InvalidInput(format!("unknown key '{}' in section '{}'", key, section))
}

fn apply_scalar_search(
    config: &mut ScalarSearchConfig,
    section: &str,
    key: &str,
    values: &[Value],
) -> Result<(), NumericalError> {
    match key {
        "tolerance" => config.tolerance = positive_float(section, key, values)?,
        "max_iterations" => config.max_iterations = positive_integer(section, key, values)?,
        "keep_history" => config.keep_history = boolean(section, key, values)?,
        _ => return Err(unknown_key(section, key)),
    }
    Ok(())
}

impl FromStr for SolverSettings {
    type Err = NumericalError;

    fn from_str(document: &str) -> Result<Self, Self::Err> {
        let parsed = parse_document_as(document, None)?;
        Self::from_document(&parsed)
    }
}

impl SolverSettings {
    pub fn from_file(path: &Path) -> Result<Self, NumericalError> {
        let document = fs::read_to_string(path).map_err(|e| {
            NumericalError::InvalidInput(format!("cannot read settings file {}: {}", path.display(), e))
        })?;
        info!("reading solver settings from {}", path.display());
        document.parse()
    }

    ///////////////////////////////////CONFIGURED SOLVERS///////////////////////////////////
    pub fn bisection_solver(&self) -> ScalarSearch {
        ScalarSearch::with_config(self.bisection.clone())
    }

    pub fn golden_section_solver(&self) -> ScalarSearch {
        ScalarSearch::with_config(self.golden_section.clone())
    }

    pub fn newton_minimizer(&self) -> NewtonMinimizer {
        NewtonMinimizer::with_config(self.newton.clone())
    }

    pub fn coordinate_descent(&self) -> CoordinateDescent {
        CoordinateDescent::with_config(self.coordinate_descent.clone())
    }

    pub fn linear_solver(&self) -> LinearSystemSolver {
        LinearSystemSolver::with_config(self.linear_solver.clone())
    }

    pub fn integrator(&self) -> Integrator {
        Integrator::with_config(self.integration.config.clone())
    }

    pub fn from_document(document: &DocumentMap) -> Result<Self, NumericalError> {
        let mut settings = SolverSettings::default();
        for (section, keys) in document {
            if !SECTIONS.contains(&section.as_str()) {
                return Err(NumericalError::InvalidInput(format!(
                    "unknown settings section '{}', expected one of {}",
                    section,
                    SECTIONS.join(", ")
                )));
            }
            for (key, values) in keys {
                // keys added by a template without values keep their defaults
                let Some(values) = values else { continue };
                settings.apply(section, key, values)?;
            }
        }
        Ok(settings)
    }

    fn apply(&mut self, section: &str, key: &str, values: &[Value]) -> Result<(), NumericalError> {
        match section {
            "bisection" => apply_scalar_search(&mut self.bisection, section, key, values)?,
            "golden_section" => apply_scalar_search(&mut self.golden_section, section, key, values)?,
            "newton" => {
                let config = &mut self.newton;
                match key {
                    "tolerance" => config.tolerance = positive_float(section, key, values)?,
                    "max_iterations" => config.max_iterations = positive_integer(section, key, values)?,
                    "first_derivative_step" => {
                        config.first_derivative_step = positive_float(section, key, values)?
                    }
                    "second_derivative_step" => {
                        config.second_derivative_step = positive_float(section, key, values)?
                    }
                    "min_curvature" => config.min_curvature = positive_float(section, key, values)?,
                    "keep_history" => config.keep_history = boolean(section, key, values)?,
                    _ => return Err(unknown_key(section, key)),
                }
            }
            "coordinate_descent" => {
                let config = &mut self.coordinate_descent;
                match key {
                    "step_size" => config.step_size = positive_float(section, key, values)?,
                    "tolerance" => config.tolerance = positive_float(section, key, values)?,
                    "max_iterations" => config.max_iterations = positive_integer(section, key, values)?,
                    "keep_history" => config.keep_history = boolean(section, key, values)?,
                    _ => return Err(unknown_key(section, key)),
                }
            }
            "linear_solver" => match key {
                "convention" => {
                    self.linear_solver.convention = variant(section, key, single(section, key, values)?)?
                }
                "singularity_tolerance" => {
                    self.linear_solver.singularity_tolerance = positive_float(section, key, values)?
                }
                "cramer_max_dimension" => {
                    self.linear_solver.cramer_max_dimension = positive_integer(section, key, values)?
                }
                "methods" => {
                    self.linear_methods = values
                        .iter()
                        .map(|v| variant(section, key, v))
                        .collect::<Result<Vec<LinearSolverMethod>, NumericalError>>()?
                }
                _ => return Err(unknown_key(section, key)),
            },
            "integration" => {
                let integration = &mut self.integration;
                match key {
                    "initial_n" => integration.config.initial_n = positive_integer(section, key, values)?,
                    "max_doublings" => {
                        integration.config.max_doublings = positive_integer(section, key, values)?
                    }
                    "max_partitions" => {
                        integration.config.max_partitions = positive_integer(section, key, values)?
                    }
                    "tolerance" => {
                        integration.mode = PartitionMode::Automatic {
                            tolerance: positive_float(section, key, values)?,
                        }
                    }
                    "n" => integration.mode = PartitionMode::Fixed(positive_integer(section, key, values)?),
                    "rules" => {
                        integration.rules = values
                            .iter()
                            .map(|v| variant(section, key, v))
                            .collect::<Result<Vec<QuadratureRule>, NumericalError>>()?
                    }
                    "keep_history" => integration.config.keep_history = boolean(section, key, values)?,
                    _ => return Err(unknown_key(section, key)),
                }
            }
            "logging" => match key {
                "loglevel" => self.logging.loglevel = text(section, key, values)?,
                "log_dir" => self.logging.log_dir = Some(text(section, key, values)?),
                _ => return Err(unknown_key(section, key)),
            },
            _ => unreachable!("sections are checked in from_document"),
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_defaults_when_document_is_empty() {
        let settings = "".parse::<SolverSettings>().unwrap();
        assert_eq!(settings.bisection.max_iterations, 500);
        assert_eq!(settings.golden_section.max_iterations, 10_000);
        assert_eq!(settings.linear_solver.convention, RhsConvention::Standard);
        assert_eq!(settings.linear_methods.len(), 3);
        assert_eq!(settings.integration.rules.len(), 5);
        assert_eq!(settings.logging.loglevel, "info");
    }

    #[test]
    fn test_full_document() {
        let document = "
            bisection tolerance: 1e-8 max_iterations: 300
            golden_section tolerance: 0.001 keep_history: false
            newton tolerance: 1e-7 max_iterations: 40 second_derivative_step: 0.001
            coordinate_descent step_size: 0.05 max_iterations: 2000
            linear_solver convention: negated methods: Gauss, Cramer cramer_max_dimension: 6
            integration rules: Simpson, RectMiddle n: 100
            logging loglevel: debug
        ";
        let settings = document.parse::<SolverSettings>().unwrap();
        assert_eq!(settings.bisection.tolerance, 1e-8);
        assert_eq!(settings.bisection.max_iterations, 300);
        assert_eq!(settings.golden_section.tolerance, 0.001);
        assert!(!settings.golden_section.keep_history);
        assert_eq!(settings.newton.max_iterations, 40);
        assert_eq!(settings.newton.second_derivative_step, 0.001);
        assert_eq!(settings.coordinate_descent.step_size, 0.05);
        assert_eq!(settings.linear_solver.convention, RhsConvention::Negated);
        assert_eq!(settings.linear_solver.cramer_max_dimension, 6);
        assert_eq!(
            settings.linear_methods,
            vec![LinearSolverMethod::Gauss, LinearSolverMethod::Cramer]
        );
        assert_eq!(
            settings.integration.rules,
            vec![QuadratureRule::Simpson, QuadratureRule::RectMiddle]
        );
        assert_eq!(settings.integration.mode, PartitionMode::Fixed(100));
        assert_eq!(settings.logging.loglevel, "debug");
    }

    #[test]
    fn test_configured_solvers_follow_document() {
        let document = "
            bisection tolerance: 1e-9
            golden_section max_iterations: 77
            newton tolerance: 1e-10 first_derivative_step: 0.0001
            coordinate_descent step_size: 0.25
            linear_solver convention: Negated cramer_max_dimension: 4
            integration initial_n: 16
        ";
        let settings: SolverSettings = document.parse().unwrap();
        assert_eq!(settings.bisection_solver().config().tolerance, 1e-9);
        assert_eq!(settings.golden_section_solver().config().max_iterations, 77);
        assert_eq!(settings.newton_minimizer().config().tolerance, 1e-10);
        assert_eq!(settings.newton_minimizer().config().first_derivative_step, 0.0001);
        assert_eq!(settings.coordinate_descent().config().step_size, 0.25);
        let linear = settings.linear_solver();
        assert_eq!(linear.config().convention, RhsConvention::Negated);
        assert_eq!(linear.config().cramer_max_dimension, 4);
        assert_eq!(settings.integrator().config().initial_n, 16);
    }

    #[test]
    fn test_settings_implement_from_str() {
        fn load<T: FromStr<Err = NumericalError>>(document: &str) -> Result<T, NumericalError> {
            T::from_str(document)
        }
        let settings: SolverSettings = load("newton max_iterations: 12").unwrap();
        assert_eq!(settings.newton.max_iterations, 12);
        assert!(load::<SolverSettings>("newton max_iterations: 0").is_err());
    }

    #[test]
    fn test_integer_tolerance_is_accepted() {
        let settings = "coordinate_descent step_size: 1".parse::<SolverSettings>().unwrap();
        assert_eq!(settings.coordinate_descent.step_size, 1.0);
    }

    #[test]
    fn test_rejects_bad_documents() {
        for document in [
            "plotting width: 10",
            "bisection tolerance: -1",
            "bisection tolerance: 1e-6, 1e-7",
            "newton max_iterations: 2.5",
            "newton damping: 0.5",
            "linear_solver convention: upside_down",
            "integration rules: Simpson, Boole",
        ] {
            assert!(
                matches!(document.parse::<SolverSettings>(), Err(NumericalError::InvalidInput(_))),
                "accepted: {}",
                document
            );
        }
    }

    #[test]
    fn test_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "// settings for the demo").unwrap();
        writeln!(file, "integration").unwrap();
        writeln!(file, "  tolerance: 1e-9").unwrap();
        writeln!(file, "  initial_n: 8").unwrap();
        let settings = SolverSettings::from_file(file.path()).unwrap();
        assert_eq!(settings.integration.config.initial_n, 8);
        assert_eq!(
            settings.integration.mode,
            PartitionMode::Automatic { tolerance: 1e-9 }
        );

        let missing = SolverSettings::from_file(Path::new("/definitely/not/here.txt"));
        assert!(matches!(missing, Err(NumericalError::InvalidInput(_))));
    }
}
