use super::ui;
use crate::core::market::{BankQuoteProvider, IndexValueProvider, RateProvider};
use anyhow::Result;
use comfy_table::Cell;

/// Fetches the three feeds concurrently and prints the market overview.
pub async fn show_market_overview(
    index_provider: &dyn IndexValueProvider,
    rate_provider: &dyn RateProvider,
    quote_provider: &dyn BankQuoteProvider,
) -> Result<()> {
    let pb = ui::new_spinner("Fetching market data...");
    let (index, rates, quotes) = futures::join!(
        index_provider.current_index(),
        rate_provider.current_rates(),
        quote_provider.current_quotes()
    );
    pb.finish_and_clear();

    let index = index?;
    let rates = rates?;
    let quotes = quotes?;

    println!(
        "{}",
        ui::style_text("Current UVA value", ui::StyleType::Title)
    );
    print!(
        "$ {}  updated {}",
        ui::style_text(&format!("{:.2}", index.value.value), ui::StyleType::TotalValue),
        index.fetched_at.format("%d/%m/%Y %H:%M"),
    );
    match ui::source_note(index.tier) {
        Some(note) => println!("  {note}"),
        None => println!(),
    }

    println!(
        "\n{}",
        ui::style_text("Mortgage rates", ui::StyleType::Title)
    );
    let mut table = ui::new_styled_table();
    table.set_header(vec![ui::header_cell("Rate"), ui::header_cell("Value")]);
    table.add_row(vec![Cell::new("TNA"), ui::percent_cell(rates.value.tna_rate)]);
    table.add_row(vec![Cell::new("TEA"), ui::percent_cell(rates.value.tea_rate)]);
    table.add_row(vec![
        Cell::new("CFTEA"),
        ui::percent_cell(rates.value.cftea_rate),
    ]);
    println!("{table}");
    print!("updated {}", rates.fetched_at.format("%d/%m/%Y %H:%M"));
    match ui::source_note(rates.tier) {
        Some(note) => println!("  {note}"),
        None => println!(),
    }

    println!(
        "\n{}",
        ui::style_text("USD quotes by bank", ui::StyleType::Title)
    );
    if quotes.value.is_empty() {
        println!(
            "{}",
            ui::style_text("No bank quote data available right now.", ui::StyleType::Subtle)
        );
    } else {
        let mut table = ui::new_styled_table();
        table.set_header(vec![
            ui::header_cell("Bank"),
            ui::header_cell("Buy"),
            ui::header_cell("Sell"),
        ]);
        for quote in &quotes.value {
            table.add_row(vec![
                Cell::new(&quote.name),
                ui::amount_cell(quote.buy),
                ui::amount_cell(quote.sell),
            ]);
        }
        println!("{table}");
        if let Some(note) = ui::source_note(quotes.tier) {
            println!("{note}");
        }
    }

    Ok(())
}
