use crate::models::{format_number, ContractQuote, StrikeRecord};
use crate::strategy::Recommendation;
use anyhow::{Context, Result};
use colored::{Color, Colorize};
use std::io::{self, Write};

/// Number of strikes highlighted on each side
pub const TOP_LEVELS: usize = 3;

pub const TABLE_HEADINGS: [&str; 7] = [
    "CE OI",
    "CE Change OI",
    "CE Volume",
    "Strike Price",
    "PE OI",
    "PE Change OI",
    "PE Volume",
];

const CE_OI_COL: usize = 0;
const STRIKE_COL: usize = 3;
const PE_OI_COL: usize = 4;

/// Something that shows a filtered set to a human
pub trait PresentationSink {
    fn render(&mut self, filtered: &[StrikeRecord]) -> Result<()>;

    fn render_recommendation(&mut self, recommendation: Option<&Recommendation>) -> Result<()>;
}

/// One table row plus its resistance (CE OI) and support (PE OI) rank, 1-based
#[derive(Debug, Clone, PartialEq)]
pub struct RankedRow {
    pub strike_price: String,
    pub call_oi: Option<f64>,
    pub call_change_oi: Option<f64>,
    pub call_volume: Option<f64>,
    pub put_oi: Option<f64>,
    pub put_change_oi: Option<f64>,
    pub put_volume: Option<f64>,
    pub resistance_rank: Option<usize>,
    pub support_rank: Option<usize>,
}

impl RankedRow {
    fn cells(&self) -> [String; 7] {
        let show = |v: Option<f64>| v.map(format_number).unwrap_or_default();
        [
            show(self.call_oi),
            show(self.call_change_oi),
            show(self.call_volume),
            self.strike_price.clone(),
            show(self.put_oi),
            show(self.put_change_oi),
            show(self.put_volume),
        ]
    }
}

/// Build table rows and rank the top call OI (resistance) and put OI (support) strikes.
///
/// Missing OI ranks as zero. Equal OI keeps row order.
pub fn rank_rows(filtered: &[StrikeRecord]) -> Vec<RankedRow> {
    let mut rows: Vec<RankedRow> = filtered
        .iter()
        .map(|r| RankedRow {
            strike_price: r.strike_label(),
            call_oi: leg_value(r.call.as_ref(), |q| q.open_interest),
            call_change_oi: leg_value(r.call.as_ref(), |q| q.change_in_oi),
            call_volume: leg_value(r.call.as_ref(), |q| q.total_traded_volume),
            put_oi: leg_value(r.put.as_ref(), |q| q.open_interest),
            put_change_oi: leg_value(r.put.as_ref(), |q| q.change_in_oi),
            put_volume: leg_value(r.put.as_ref(), |q| q.total_traded_volume),
            resistance_rank: None,
            support_rank: None,
        })
        .collect();

    for (rank, idx) in top_indices(&rows, |row| row.call_oi).into_iter().enumerate() {
        rows[idx].resistance_rank = Some(rank + 1);
    }
    for (rank, idx) in top_indices(&rows, |row| row.put_oi).into_iter().enumerate() {
        rows[idx].support_rank = Some(rank + 1);
    }

    rows
}

fn leg_value(leg: Option<&ContractQuote>, pick: fn(&ContractQuote) -> Option<f64>) -> Option<f64> {
    leg.and_then(pick)
}

fn top_indices(rows: &[RankedRow], oi: fn(&RankedRow) -> Option<f64>) -> Vec<usize> {
    let mut order: Vec<usize> = (0..rows.len()).collect();
    let key = |idx: usize| oi(&rows[idx]).unwrap_or(0.0);
    // sort_by is stable, descending
    order.sort_by(|&a, &b| key(b).total_cmp(&key(a)));
    order.truncate(TOP_LEVELS);
    order
}

/// Resistance colors by rank: red, yellow, magenta
pub fn resistance_style(rank: usize) -> Option<Color> {
    match rank {
        1 => Some(Color::Red),
        2 => Some(Color::Yellow),
        3 => Some(Color::Magenta),
        _ => None,
    }
}

/// Support colors by rank: green, blue, cyan
pub fn support_style(rank: usize) -> Option<Color> {
    match rank {
        1 => Some(Color::Green),
        2 => Some(Color::Blue),
        3 => Some(Color::Cyan),
        _ => None,
    }
}

/// Render the ranked rows as a bordered table with a centered strike column
pub fn render_table(title: &str, rows: &[RankedRow]) -> String {
    let cells: Vec<[String; 7]> = rows.iter().map(RankedRow::cells).collect();

    let mut widths: Vec<usize> = TABLE_HEADINGS.iter().map(|h| h.chars().count()).collect();
    for row in &cells {
        for (col, cell) in row.iter().enumerate() {
            widths[col] = widths[col].max(cell.chars().count());
        }
    }

    // Widen the last column if the title does not fit
    let title_len = title.chars().count();
    if title_len + 2 > inner_width(&widths) {
        let deficit = title_len + 2 - inner_width(&widths);
        if let Some(last) = widths.last_mut() {
            *last += deficit;
        }
    }

    let separator = {
        let mut line = String::from("+");
        for w in &widths {
            line.push_str(&"-".repeat(w + 2));
            line.push('+');
        }
        line
    };

    let mut out = String::new();
    let title_sep = format!("+{}+", "-".repeat(inner_width(&widths)));
    out.push_str(&title_sep);
    out.push('\n');
    out.push_str(&format!("| {} |\n", center(title, inner_width(&widths) - 2)));
    out.push_str(&separator);
    out.push('\n');

    let headings: Vec<String> = TABLE_HEADINGS
        .iter()
        .enumerate()
        .map(|(col, h)| pad_cell(h, widths[col], col == STRIKE_COL))
        .collect();
    out.push_str(&format!("| {} |\n", headings.join(" | ")));
    out.push_str(&separator);
    out.push('\n');

    for (row, row_cells) in rows.iter().zip(&cells) {
        let rendered: Vec<String> = row_cells
            .iter()
            .enumerate()
            .map(|(col, cell)| {
                let padded = pad_cell(cell, widths[col], col == STRIKE_COL);
                let color = match col {
                    CE_OI_COL => row.resistance_rank.and_then(resistance_style),
                    PE_OI_COL => row.support_rank.and_then(support_style),
                    _ => None,
                };
                match color {
                    Some(c) => padded.as_str().color(c).to_string(),
                    None => padded,
                }
            })
            .collect();
        out.push_str(&format!("| {} |\n", rendered.join(" | ")));
    }
    out.push_str(&separator);
    out.push('\n');

    out
}

/// Width between the outer borders
fn inner_width(widths: &[usize]) -> usize {
    widths.iter().map(|w| w + 2).sum::<usize>() + widths.len() - 1
}

fn pad_cell(text: &str, width: usize, centered: bool) -> String {
    if centered {
        center(text, width)
    } else {
        format!("{:<width$}", text, width = width)
    }
}

fn center(text: &str, width: usize) -> String {
    let len = text.chars().count();
    if len >= width {
        return text.to_string();
    }
    let left = (width - len) / 2;
    let right = width - len - left;
    format!("{}{}{}", " ".repeat(left), text, " ".repeat(right))
}

/// Recommendation block shown after the table
pub fn format_recommendation(recommendation: Option<&Recommendation>) -> String {
    match recommendation {
        Some(rec) => format!(
            "{}\n{} - Strike Price: {}\nBUY Range: {}\nStop Loss Range: {}\nTarget Range: {}\nScore (OI x IV): {:.2}\n",
            "Most Profitable Option:".green().bold(),
            rec.side.code().yellow(),
            rec.strike_price,
            rec.entry_range,
            rec.stop_loss_range,
            rec.target_range,
            rec.score,
        ),
        None => format!("{}\n", "No profitable option found based on OI and IV.".yellow()),
    }
}

/// Prints tables and recommendations to a writer (stdout by default)
pub struct ConsolePresenter<W: Write> {
    title: String,
    out: W,
}

impl ConsolePresenter<io::Stdout> {
    pub fn stdout(symbol: &str) -> Self {
        Self::new(symbol, io::stdout())
    }
}

impl<W: Write> ConsolePresenter<W> {
    pub fn new(symbol: &str, out: W) -> Self {
        Self {
            title: format!("{} Option Chain (Filtered)", symbol),
            out,
        }
    }

    pub fn into_inner(self) -> W {
        self.out
    }
}

impl<W: Write> PresentationSink for ConsolePresenter<W> {
    fn render(&mut self, filtered: &[StrikeRecord]) -> Result<()> {
        let rows = rank_rows(filtered);
        let table = render_table(&self.title, &rows);
        self.out
            .write_all(table.as_bytes())
            .and_then(|_| self.out.flush())
            .context("Failed to write option chain table")
    }

    fn render_recommendation(&mut self, recommendation: Option<&Recommendation>) -> Result<()> {
        let block = format_recommendation(recommendation);
        self.out
            .write_all(block.as_bytes())
            .and_then(|_| self.out.flush())
            .context("Failed to write recommendation")
    }
}
