//! Command-line interface definitions and argument parsing

use std::path::PathBuf;

use clap::Parser;

use crate::config::AnalysisConfig;

/// Sales KPIs, ABC product classification and RFM customer segmentation
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
pub struct Args {
    /// Path to the sales export CSV (overrides the config file)
    #[arg(short, long)]
    pub input: Option<PathBuf>,

    /// Directory for the RFM table and charts (overrides the config file)
    #[arg(short, long)]
    pub output: Option<PathBuf>,

    /// Optional TOML file with paths, thresholds and chart settings
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    /// Write only the RFM table, no chart images
    #[arg(long)]
    pub skip_charts: bool,

    /// Enable verbose output
    #[arg(short, long)]
    pub verbose: bool,
}

impl Args {
    /// Build the run configuration: defaults, then the config file, then flags
    pub fn analysis_config(&self) -> crate::Result<AnalysisConfig> {
        let mut config = match &self.config {
            Some(path) => AnalysisConfig::from_toml_file(path)
                .map_err(|e| anyhow::anyhow!("Invalid config file {}: {}", path.display(), e))?,
            None => AnalysisConfig::default(),
        };

        if let Some(input) = &self.input {
            config.input_path = input.clone();
        }
        if let Some(output) = &self.output {
            config.output_dir = output.clone();
        }

        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn test_analysis_config_defaults_and_overrides() {
        let mut args = Args {
            input: None,
            output: None,
            config: None,
            skip_charts: false,
            verbose: false,
        };

        let config = args.analysis_config().unwrap();
        assert_eq!(config, AnalysisConfig::default());

        args.input = Some(PathBuf::from("sales.csv"));
        args.output = Some(PathBuf::from("out"));
        let config = args.analysis_config().unwrap();
        assert_eq!(config.input_path, PathBuf::from("sales.csv"));
        assert_eq!(config.output_dir, PathBuf::from("out"));
    }

    #[test]
    fn test_analysis_config_from_file() {
        let mut file = NamedTempFile::new().unwrap();
        writeln!(file, "input_path = \"from_file.csv\"").unwrap();
        writeln!(file, "[charts]").unwrap();
        writeln!(file, "top_n = 5").unwrap();

        let args = Args {
            input: None,
            output: Some(PathBuf::from("cli_out")),
            config: Some(file.path().to_path_buf()),
            skip_charts: true,
            verbose: false,
        };

        let config = args.analysis_config().unwrap();
        assert_eq!(config.input_path, PathBuf::from("from_file.csv"));
        assert_eq!(config.output_dir, PathBuf::from("cli_out"));
        assert_eq!(config.charts.top_n, 5);

        let args = Args {
            config: Some(PathBuf::from("/nonexistent/salesforge.toml")),
            ..args
        };
        assert!(args.analysis_config().is_err());
    }

    #[test]
    fn test_parse_flags() {
        let args = Args::parse_from(["salesforge", "-i", "data.csv", "--skip-charts", "-v"]);
        assert_eq!(args.input, Some(PathBuf::from("data.csv")));
        assert!(args.skip_charts);
        assert!(args.verbose);
        assert_eq!(args.output, None);
    }
}
