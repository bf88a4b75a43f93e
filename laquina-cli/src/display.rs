use comfy_table::{Table, ContentArrangement, presets::UTF8_FULL, Cell, Color};

use crate::backtest::BacktestSummary;
use crate::import::ImportResult;
use crate::sweep::SweepReport;
use laquina_db::models::Draw;
use laquina_engine::stats::Statistics;
use laquina_engine::{OutcomeReport, PredictionSet};

fn format_numbers(numbers: &[u8]) -> String {
    numbers
        .iter()
        .map(|b| format!("{:2}", b))
        .collect::<Vec<_>>()
        .join(" - ")
}

fn new_table(header: Vec<&str>) -> Table {
    let mut table = Table::new();
    table
        .load_preset(UTF8_FULL)
        .set_content_arrangement(ContentArrangement::Dynamic)
        .set_header(header);
    table
}

pub fn display_draws(draws: &[Draw]) {
    if draws.is_empty() {
        println!("Aucun tirage à afficher.");
        return;
    }

    let mut table = new_table(vec!["Concours", "Date", "Numéros", "Ordre de sortie"]);
    for draw in draws {
        table.add_row(vec![
            draw.contest.to_string(),
            draw.date.clone(),
            format_numbers(&draw.sorted_numbers()),
            format_numbers(draw.numbers()),
        ]);
    }

    println!("{table}");
}

pub fn display_import_summary(result: &ImportResult) {
    println!("Import terminé :");
    println!("  Total lignes lues : {}", result.total_records);
    println!("  Insérés           : {}", result.inserted);
    println!("  Doublons ignorés  : {}", result.skipped);
    if result.errors > 0 {
        println!("  Erreurs           : {}", result.errors);
    }
}

pub fn display_stats(stats: &Statistics) {
    println!("\n📊 Statistiques sur {} tirages\n", stats.n_draws);

    let mut table = new_table(vec!["Numéro", "Fréquence", "Retard", "Marginale", "Tag"]);

    let mut numbers: Vec<u8> = stats.game.numbers().collect();
    numbers.sort_by(|&a, &b| {
        stats.marginal[b as usize]
            .partial_cmp(&stats.marginal[a as usize])
            .unwrap_or(std::cmp::Ordering::Equal)
            .then(a.cmp(&b))
    });

    for n in numbers {
        let i = n as usize;
        let (tag, color) = if stats.hot[i] { ("HOT", Color::Green) } else { ("COLD", Color::Red) };
        table.add_row(vec![
            Cell::new(format!("{:2}", n)),
            Cell::new(stats.frequency[i]),
            Cell::new(stats.contests_ago[i]),
            Cell::new(format!("{:.4}", stats.marginal[i])),
            Cell::new(tag).fg(color),
        ]);
    }
    println!("{table}");
}

pub fn display_predictions(set: &PredictionSet) {
    println!("\n🎲 Grilles suggérées (seed {})\n", set.seed);
    if set.is_empty() {
        println!("Aucune grille produite.");
        return;
    }

    let mut table = new_table(vec!["#", "Numéros", "Score"]);
    for (i, candidate) in set.candidates.iter().enumerate() {
        table.add_row(vec![
            format!("{}", i + 1),
            format_numbers(&candidate.numbers),
            format!("{:.4}", candidate.score),
        ]);
    }
    println!("{table}");
}

pub fn display_outcome(set: &PredictionSet, actual: &[u8], report: &OutcomeReport) {
    println!("\nTirage : {}\n", format_numbers(actual));

    let mut table = new_table(vec!["#", "Numéros", "Bons numéros"]);
    for (i, (candidate, &hits)) in set.candidates.iter().zip(report.hits.iter()).enumerate() {
        let color = if Some(i) == report.best_index { Color::Green } else { Color::White };
        table.add_row(vec![
            Cell::new(i + 1),
            Cell::new(format_numbers(&candidate.numbers)),
            Cell::new(hits).fg(color),
        ]);
    }
    println!("{table}");

    match report.best_index {
        Some(i) => println!(
            "Meilleure grille : #{} avec {} bon(s) numéro(s) [{}]",
            i + 1,
            report.best_hits,
            format_numbers(&report.matched)
        ),
        None => println!("Aucune grille à comparer."),
    }
    display_tiers(report);
}

fn display_tiers(report: &OutcomeReport) {
    println!(
        "Quina : {}  Quadra : {}  Terno : {}",
        report.jackpot, report.minus_one, report.minus_two
    );
    let histogram = report
        .histogram
        .iter()
        .enumerate()
        .map(|(k, n)| format!("{k}:{n}"))
        .collect::<Vec<_>>()
        .join("  ");
    println!("Histogramme : {histogram}");
}

pub fn display_backtest(summary: &BacktestSummary, run_id: Option<&str>) {
    let mut table = new_table(vec!["Concours", "Seed", "Grilles", "Meilleur", "Numéros trouvés"]);
    for row in &summary.rows {
        table.add_row(vec![
            row.contest.to_string(),
            row.predictions.seed.to_string(),
            row.predictions.len().to_string(),
            row.outcome.best_hits.to_string(),
            format_numbers(&row.outcome.matched),
        ]);
    }
    println!("{table}");

    println!("\nConcours rejoués : {}", summary.rows.len());
    println!("Moyenne du meilleur résultat : {:.3}", summary.mean_best_hits);
    display_tiers(&summary.totals);
    if let Some(id) = run_id {
        println!("Résultats enregistrés sous {id}");
    }
}

pub fn display_sweep_top(report: &SweepReport, top: usize) {
    println!("\n🏆 Top {} sur {} variations ({} concours chacune)\n", top.min(report.entries.len()), report.evaluated, report.contests);

    let mut table = new_table(vec!["#", "Réglages", "Moyenne", "Quina", "Quadra", "Terno"]);
    for (i, entry) in report.entries.iter().take(top).enumerate() {
        let overrides = entry
            .overrides
            .iter()
            .map(|(k, v)| format!("{k}={v}"))
            .collect::<Vec<_>>()
            .join(", ");
        table.add_row(vec![
            format!("{}", i + 1),
            if overrides.is_empty() { "(base)".to_string() } else { overrides },
            format!("{:.3}", entry.mean_best_hits),
            entry.jackpot.to_string(),
            entry.minus_one.to_string(),
            entry.minus_two.to_string(),
        ]);
    }
    println!("{table}");
}
