mod backtest;
mod display;
mod import;
mod sweep;
mod tuning;

use std::path::PathBuf;

use anyhow::{Context, Result, bail};
use clap::{Parser, Subcommand};
use indicatif::{ProgressBar, ProgressStyle};

use laquina_db::db::{count_draws, db_path, fetch_history, fetch_last_draws, migrate, open_db};
use laquina_db::models::validate_draw;
use laquina_db::rusqlite::Connection;
use laquina_engine::stats::Statistics;
use laquina_engine::{CancellationToken, PredictionSet, generate, score_outcome};

use crate::display::{
    display_backtest, display_draws, display_import_summary, display_outcome, display_predictions,
    display_stats, display_sweep_top,
};
use crate::tuning::TuningArgs;

#[derive(Parser)]
#[command(name = "laquina", about = "Générateur de grilles Quina (5 numéros parmi 80)")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Importer les tirages depuis un fichier CSV
    Import {
        /// Chemin vers le fichier CSV (concours;date;n1..n5)
        #[arg(short, long, default_value = "assets/quina.csv")]
        file: PathBuf,
    },

    /// Afficher le chemin de la base de données
    DbPath,

    /// Lister les derniers tirages
    List {
        /// Nombre de tirages à afficher
        #[arg(short, long, default_value = "10")]
        last: u32,
    },

    /// Afficher fréquences, retards et probabilités marginales
    Stats {
        #[command(flatten)]
        tuning: TuningArgs,
    },

    /// Générer des grilles pour le prochain tirage
    Predict {
        #[command(flatten)]
        tuning: TuningArgs,

        /// Sauvegarder les grilles (JSON) pour un `check` ultérieur
        #[arg(long)]
        save: Option<PathBuf>,
    },

    /// Comparer des grilles sauvegardées avec un tirage
    Check {
        /// Fichier JSON produit par `predict --save`
        #[arg(short, long)]
        predictions: PathBuf,

        /// Les 5 numéros tirés
        #[arg(num_args = 5, required = true)]
        numbers: Vec<u8>,
    },

    /// Rejouer les derniers concours avec l'historique qui les précède
    Backtest {
        #[command(flatten)]
        tuning: TuningArgs,

        /// Nombre de concours rejoués
        #[arg(long, default_value = "50")]
        contests: usize,

        /// Tirages d'historique conservés avant chaque concours (0 = tous)
        #[arg(long, default_value = "0")]
        history: usize,

        /// Nombre de threads (0 = tous les cœurs)
        #[arg(short, long, default_value = "0")]
        jobs: usize,

        /// Ne pas enregistrer les résultats en base
        #[arg(long)]
        no_save: bool,
    },

    /// Balayer une grille de paramètres et classer les variations par backtest
    Sweep {
        /// Fichier JSON décrivant la grille
        #[arg(short, long)]
        spec: PathBuf,

        /// Nombre de concours rejoués par variation
        #[arg(long, default_value = "30")]
        contests: usize,

        /// Tirages d'historique conservés avant chaque concours (0 = tous)
        #[arg(long, default_value = "0")]
        history: usize,

        /// Nombre de threads (0 = tous les cœurs)
        #[arg(short, long, default_value = "0")]
        jobs: usize,

        /// Nombre de variations affichées
        #[arg(long, default_value = "10")]
        top: usize,

        /// Rapport JSON complet
        #[arg(short, long, default_value = "laquina_sweep.json")]
        output: PathBuf,
    },
}

fn main() -> Result<()> {
    env_logger::init();
    let cli = Cli::parse();
    let path = db_path();
    let conn = open_db(&path)?;
    migrate(&conn)?;

    match cli.command {
        Command::Import { file } => cmd_import(&conn, &file),
        Command::DbPath => {
            println!("{}", path.display());
            Ok(())
        }
        Command::List { last } => cmd_list(&conn, last),
        Command::Stats { tuning } => cmd_stats(&conn, &tuning),
        Command::Predict { tuning, save } => cmd_predict(&conn, &tuning, save.as_deref()),
        Command::Check { predictions, numbers } => cmd_check(&predictions, &numbers),
        Command::Backtest { tuning, contests, history, jobs, no_save } => {
            cmd_backtest(&conn, &tuning, contests, history, jobs, !no_save)
        }
        Command::Sweep { spec, contests, history, jobs, top, output } => {
            cmd_sweep(&conn, &spec, contests, history, jobs, top, &output)
        }
    }
}

fn ensure_draws(conn: &Connection) -> Result<u32> {
    let n = count_draws(conn)?;
    if n == 0 {
        bail!("Base vide. Lancez d'abord : laquina import");
    }
    Ok(n)
}

fn thread_pool(jobs: usize) -> Result<rayon::ThreadPool> {
    rayon::ThreadPoolBuilder::new()
        .num_threads(jobs)
        .build()
        .context("Impossible de créer le pool de threads")
}

fn cmd_import(conn: &Connection, file: &PathBuf) -> Result<()> {
    let result = import::import_csv(conn, file)?;
    display_import_summary(&result);
    Ok(())
}

fn cmd_list(conn: &Connection, last: u32) -> Result<()> {
    ensure_draws(conn)?;
    let draws = fetch_last_draws(conn, last)?;
    display_draws(&draws);
    Ok(())
}

fn cmd_stats(conn: &Connection, tuning: &TuningArgs) -> Result<()> {
    ensure_draws(conn)?;
    let params = tuning.resolve()?;
    let history = fetch_history(conn)?;
    let stats = Statistics::compute(&history, &params);
    display_stats(&stats);
    Ok(())
}

fn cmd_predict(conn: &Connection, tuning: &TuningArgs, save: Option<&std::path::Path>) -> Result<()> {
    let n = ensure_draws(conn)?;
    let params = tuning.resolve()?;
    let history = fetch_history(conn)?;
    println!("{} tirages chargés", n);

    let set = generate(&history, &params, &CancellationToken::new())
        .context("Échec de la génération")?;
    display_predictions(&set);

    if let Some(path) = save {
        let json = serde_json::to_string_pretty(&set)?;
        std::fs::write(path, json)
            .with_context(|| format!("Impossible d'écrire {:?}", path))?;
        println!("\nGrilles sauvegardées dans {}", path.display());
    }
    Ok(())
}

fn cmd_check(predictions: &PathBuf, numbers: &[u8]) -> Result<()> {
    validate_draw(numbers)?;
    let json = std::fs::read_to_string(predictions)
        .with_context(|| format!("Impossible de lire {:?}", predictions))?;
    let set: PredictionSet = serde_json::from_str(&json)
        .with_context(|| format!("JSON invalide dans {:?}", predictions))?;

    let report = score_outcome(&set.candidates, numbers);
    display_outcome(&set, numbers, &report);
    Ok(())
}

fn cmd_backtest(
    conn: &Connection,
    tuning: &TuningArgs,
    contests: usize,
    history_window: usize,
    jobs: usize,
    save: bool,
) -> Result<()> {
    ensure_draws(conn)?;
    let params = tuning.resolve()?;
    let draws = fetch_history(conn)?;
    let replayed = backtest::target_indices(draws.len(), contests).len();

    println!("Backtest sur {} concours ({} tirages en base)...", replayed, draws.len());
    let pb = ProgressBar::new(replayed as u64);
    pb.set_style(
        ProgressStyle::with_template(
            "{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} ({eta})",
        )?
        .progress_chars("=> "),
    );

    let pool = thread_pool(jobs)?;
    let summary = pool.install(|| {
        backtest::run_backtest(&draws, &params, contests, history_window, Some(&pb))
    })?;
    pb.finish_and_clear();

    let run_id = if save {
        let id = backtest::new_run_id();
        backtest::persist_backtest(conn, &id, &params, &summary)?;
        Some(id)
    } else {
        None
    };
    display_backtest(&summary, run_id.as_deref());
    Ok(())
}

fn cmd_sweep(
    conn: &Connection,
    spec_path: &PathBuf,
    contests: usize,
    history_window: usize,
    jobs: usize,
    top: usize,
    output: &PathBuf,
) -> Result<()> {
    ensure_draws(conn)?;
    let spec = sweep::load_spec(spec_path)?;
    let variations = sweep::expand(&spec)?;
    let draws = fetch_history(conn)?;
    println!("{} variations à évaluer sur {} concours", variations.len(), contests);

    let pool = thread_pool(jobs)?;
    let report = pool.install(|| sweep::run_sweep(&draws, &variations, contests, history_window))?;
    display_sweep_top(&report, top);
    sweep::save_report(&report, output)?;
    println!("\nRapport complet sauvegardé dans {}", output.display());
    Ok(())
}
