//! Offline accuracy harness: replays labeled queries through the pipeline
//! against the live backends and reports per-source accuracy.

use std::{collections::BTreeMap, fs, path::PathBuf};

use clap::Parser;
use color_eyre::eyre;
use serde::Deserialize;
use tracing_subscriber::EnvFilter;

use arq_service::{ArqService, ResolveRequest};

#[derive(Debug, Parser)]
#[command(
	version = arq_cli::VERSION,
	rename_all = "kebab",
	styles = arq_cli::styles(),
)]
pub struct Args {
	#[arg(long, short = 'c', value_name = "FILE")]
	pub config: PathBuf,
	/// JSONL file: one {"tenant", "query", "expected_faq_id"} per line.
	#[arg(long, value_name = "FILE")]
	pub cases: PathBuf,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Case {
	pub tenant: String,
	pub query: String,
	/// Absent means the expected outcome is "not found".
	pub expected_faq_id: Option<String>,
}

#[derive(Debug, Default)]
pub struct SourceTally {
	pub total: usize,
	pub correct: usize,
}

#[derive(Debug, Default)]
pub struct Report {
	pub total: usize,
	pub correct: usize,
	pub by_source: BTreeMap<String, SourceTally>,
}

impl Report {
	pub fn record(&mut self, source: &str, correct: bool) {
		self.total += 1;

		if correct {
			self.correct += 1;
		}

		let tally = self.by_source.entry(source.to_string()).or_default();

		tally.total += 1;

		if correct {
			tally.correct += 1;
		}
	}

	pub fn accuracy(&self) -> f32 {
		if self.total == 0 {
			return 0.0;
		}

		self.correct as f32 / self.total as f32
	}
}

pub async fn run(args: Args) -> color_eyre::Result<()> {
	let config = arq_config::load(&args.config)?;
	let filter =
		EnvFilter::try_new(&config.service.log_level).unwrap_or_else(|_| EnvFilter::new("info"));

	tracing_subscriber::fmt().with_env_filter(filter).init();

	let tenants = arq_config::load_tenants(&config.tenants.dir)?;
	let service = ArqService::new(config, tenants);
	let cases = load_cases(&args.cases)?;

	if cases.is_empty() {
		return Err(eyre::eyre!("No cases found in {:?}.", args.cases));
	}

	let mut report = Report::default();

	for case in &cases {
		let response = service
			.resolve(ResolveRequest { tenant: case.tenant.clone(), query: case.query.clone() })
			.await;

		match response {
			Ok(response) => {
				let got = response.faq_id.as_deref();
				let correct = got == case.expected_faq_id.as_deref();
				let source = response
					.decisions
					.first()
					.map(|decision| decision.source.as_str())
					.unwrap_or("none");

				if !correct {
					tracing::info!(
						tenant = case.tenant.as_str(),
						query = case.query.as_str(),
						expected = case.expected_faq_id.as_deref().unwrap_or("-"),
						got = got.unwrap_or("-"),
						source,
						"Mismatch."
					);
				}

				report.record(source, correct);
			},
			Err(err) => {
				tracing::warn!(tenant = case.tenant.as_str(), query = case.query.as_str(), error = %err, "Case failed.");

				report.record("error", false);
			},
		}
	}

	print_report(&report);

	Ok(())
}

fn load_cases(path: &PathBuf) -> color_eyre::Result<Vec<Case>> {
	let raw = fs::read_to_string(path)?;
	let mut out = Vec::new();

	for (number, line) in raw.lines().enumerate() {
		let line = line.trim();

		if line.is_empty() {
			continue;
		}

		let case: Case = serde_json::from_str(line)
			.map_err(|err| eyre::eyre!("Invalid case on line {}: {err}.", number + 1))?;

		out.push(case);
	}

	Ok(out)
}

fn print_report(report: &Report) {
	println!("cases: {}", report.total);
	println!("correct: {} ({:.1}%)", report.correct, report.accuracy() * 100.0);
	println!("by source:");

	for (source, tally) in &report.by_source {
		let accuracy =
			if tally.total == 0 { 0.0 } else { tally.correct as f32 / tally.total as f32 };

		println!("  {source}: {}/{} ({:.1}%)", tally.correct, tally.total, accuracy * 100.0);
	}
}
