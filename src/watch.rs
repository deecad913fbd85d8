//! The sampling loop: ticker + metric source + table, one flush per tick.

use crate::formatting::humanize;
use crate::queues::DomainMap;
use crate::table::{center, right, Row, Table};
use crate::ticker::Ticker;
use crate::Result;
use std::io::Write;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

/// Build the standard page-queue table: a narrow domain-id column and one
/// right-justified byte-quantity column per queue, grouped under a shared
/// heading. `page_size` converts the sampled page counts into bytes before
/// formatting.
pub fn queue_table(field_width: usize, divisor: u64, page_size: u64) -> Result<Table> {
    let mut table = Table::new();
    table.add_column("dom", "DOM", 3, None, Some(right));
    for (key, heading) in [("active", "ACTIVE"), ("inactive", "INACTIVE"), ("free", "FREE")] {
        let human = humanize(field_width, divisor);
        table.add_column(
            key,
            heading,
            field_width,
            Some(Box::new(move |pages: u64| human(pages.saturating_mul(page_size)))),
            Some(right),
        );
    }
    table.add_group("page queues", 3, center)?;
    Ok(table)
}

/// Repeatedly samples a pull-based source and renders one table body per
/// tick. The source is any `FnMut` returning a domain map, so tests can
/// substitute a fixed snapshot for the sysfs reader.
pub struct Watch<F> {
    table: Table,
    ticker: Ticker,
    sample: F,
}

impl<F> Watch<F>
where
    F: FnMut() -> Result<DomainMap>,
{
    pub fn new(interval: Duration, table: Table, sample: F) -> Self {
        Watch {
            table,
            ticker: Ticker::new(interval),
            sample,
        }
    }

    /// Write the header lines once, ahead of the first tick.
    pub fn print_header<W: Write>(&mut self, out: &mut W) -> Result<()> {
        self.table.print_header();
        self.table.flush(out, None)?;
        Ok(())
    }

    /// One sample-and-render cycle: divider, one row per domain in ascending
    /// id order, then a single flush.
    pub fn tick_once<W: Write>(&mut self, out: &mut W) -> Result<()> {
        let domains = (self.sample)()?;
        self.table.print_divider();
        for (dom, queues) in &domains {
            let mut row = Row::new();
            row.insert("dom".to_string(), u64::from(*dom));
            for (name, pages) in queues {
                row.insert(name.clone(), *pages);
            }
            self.table.print_row(&row)?;
        }
        self.table.flush(out, None)?;
        Ok(())
    }

    /// Run until `running` is cleared or `count` ticks have fired. Output
    /// failures propagate and terminate the loop.
    pub fn run<W: Write>(
        &mut self,
        out: &mut W,
        running: &AtomicBool,
        count: Option<u64>,
    ) -> Result<()> {
        self.print_header(out)?;
        let mut ticks = 0u64;
        while running.load(Ordering::Relaxed) {
            if let Some(limit) = count {
                if ticks >= limit {
                    break;
                }
            }
            self.ticker.tick();
            if !running.load(Ordering::Relaxed) {
                break;
            }
            self.tick_once(out)?;
            ticks += 1;
        }
        Ok(())
    }
}
