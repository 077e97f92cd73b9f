use anyhow::{Context, Result};
use cardmail_core::StatementResult;
use std::path::Path;

/// Human-readable rundown of what was found, one block per email.
pub fn print_summary(results: &[StatementResult]) {
    println!("Found statement details in {} email(s)\n", results.len());
    for r in results {
        println!("[{}] {}", r.email_id, r.subject);
        println!("  from:        {}", r.sender);
        println!("  date:        {}", r.date);
        println!("  source:      {}", r.source.as_str());
        println!("  total due:   {}", fmt_amount(r.details.total_amount_due));
        println!("  minimum due: {}", fmt_amount(r.details.minimum_amount_due));
        println!("  due date:    {}", fmt_text(r.details.due_date.as_deref()));
        if let Some(statement_date) = r.details.statement_date.as_deref() {
            println!("  statement:   {statement_date}");
        }
        if let Some(card) = r.details.card_last_4_digits.as_deref() {
            println!("  card:        xxxx-{card}");
        }
        if let Some(bank) = r.details.bank_name.as_deref() {
            println!("  bank:        {bank}");
        }
        println!();
    }
}

pub fn write_csv(path: &Path, results: &[StatementResult]) -> Result<()> {
    let mut wtr =
        csv::Writer::from_path(path).with_context(|| format!("open {}", path.display()))?;

    wtr.write_record([
        "email_id",
        "subject",
        "sender",
        "date",
        "source",
        "total_amount_due",
        "minimum_amount_due",
        "due_date",
        "statement_date",
        "card_last_4_digits",
        "bank_name",
    ])
    .context("write csv header")?;

    for r in results {
        wtr.write_record([
            r.email_id.clone(),
            r.subject.clone(),
            r.sender.clone(),
            r.date.clone(),
            r.source.as_str().to_string(),
            fmt_amount(r.details.total_amount_due),
            fmt_amount(r.details.minimum_amount_due),
            fmt_text(r.details.due_date.as_deref()),
            fmt_text(r.details.statement_date.as_deref()),
            fmt_text(r.details.card_last_4_digits.as_deref()),
            fmt_text(r.details.bank_name.as_deref()),
        ])
        .context("write csv row")?;
    }

    wtr.flush().context("flush csv")?;
    Ok(())
}

fn fmt_amount(value: Option<f64>) -> String {
    match value {
        Some(amount) => format!("{amount:.2}"),
        None => String::new(),
    }
}

fn fmt_text(value: Option<&str>) -> String {
    value.unwrap_or_default().to_string()
}
