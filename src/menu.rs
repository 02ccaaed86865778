//! Interactive Menu
//!
//! The numbered, line-based front end over `RecordService`. Generic over its
//! input and output streams so it can run against stdin/stdout or in-memory
//! buffers.
//!
//! Every service error is printed as a `❌` line and the menu is shown
//! again; only I/O failures on the streams themselves end the loop early.

use tokio::io::{AsyncBufRead, AsyncBufReadExt, AsyncWrite, AsyncWriteExt};

use crate::error::Result;
use crate::record::Record;
use crate::service::RecordService;
use crate::storage::{SortDirection, SortField, SortSpec};

pub const MENU_TEXT: &str = "
===== RecordVault =====
1. Add Record
2. List Records
3. Update Record
4. Delete Record
5. Search Records
6. Sort Records
7. Export Data
8. View Vault Statistics
9. Exit
=======================
";

/// Whether the loop keeps going after a command
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Step {
    Continue,
    Exit,
}

/// Line-based menu driving a `RecordService`
pub struct Menu<'a, R, W> {
    service: &'a RecordService,
    input: R,
    output: W,
}

impl<'a, R, W> Menu<'a, R, W>
where
    R: AsyncBufRead + Unpin,
    W: AsyncWrite + Unpin,
{
    pub fn new(service: &'a RecordService, input: R, output: W) -> Self {
        Self {
            service,
            input,
            output,
        }
    }

    /// Run until the user picks Exit or input ends
    pub async fn run(&mut self) -> Result<()> {
        loop {
            self.write(MENU_TEXT).await?;
            let choice = match self.prompt("Choose option: ").await? {
                Some(choice) => choice,
                None => return Ok(()),
            };

            if self.handle(choice.trim()).await? == Step::Exit {
                return Ok(());
            }
        }
    }

    /// Give the output stream back (used by tests to inspect what was printed)
    pub fn into_output(self) -> W {
        self.output
    }

    async fn handle(&mut self, choice: &str) -> Result<Step> {
        let outcome = match choice {
            "1" => self.add().await,
            "2" => self.list().await,
            "3" => self.update().await,
            "4" => self.delete().await,
            "5" => self.search().await,
            "6" => self.sort().await,
            "7" => self.export().await,
            "8" => self.statistics().await,
            "9" => {
                self.println("👋 Exiting RecordVault...").await?;
                return Ok(Step::Exit);
            }
            _ => {
                self.println("Invalid option.").await?;
                return Ok(Step::Continue);
            }
        };

        match outcome {
            Ok(step) => Ok(step),
            Err(e) => {
                tracing::debug!("Command {} failed: {}", choice, e);
                self.println(&format!("❌ {}", e)).await?;
                Ok(Step::Continue)
            }
        }
    }

    // =========================================================================
    // Commands
    // =========================================================================

    async fn add(&mut self) -> Result<Step> {
        let Some(name) = self.prompt("Enter name: ").await? else {
            return Ok(Step::Exit);
        };
        let Some(value) = self.prompt("Enter value: ").await? else {
            return Ok(Step::Exit);
        };

        self.service.add(&name, &value).await?;
        self.println("✅ Record added successfully!").await?;
        Ok(Step::Continue)
    }

    async fn list(&mut self) -> Result<Step> {
        let records = self.service.list().await?;
        if records.is_empty() {
            self.println("No records found.").await?;
        }
        for record in &records {
            self.println(&summary_line(record)).await?;
        }
        Ok(Step::Continue)
    }

    async fn update(&mut self) -> Result<Step> {
        let Some(raw_id) = self.prompt("Enter record ID to update: ").await? else {
            return Ok(Step::Exit);
        };
        let Some(id) = self.parse_id(&raw_id).await? else {
            return Ok(Step::Continue);
        };
        let Some(name) = self.prompt("New name: ").await? else {
            return Ok(Step::Exit);
        };
        let Some(value) = self.prompt("New value: ").await? else {
            return Ok(Step::Exit);
        };

        match self.service.update(id, &name, &value).await? {
            Some(_) => self.println("✅ Record updated!").await?,
            None => self.println("❌ Record not found.").await?,
        }
        Ok(Step::Continue)
    }

    async fn delete(&mut self) -> Result<Step> {
        let Some(raw_id) = self.prompt("Enter record ID to delete: ").await? else {
            return Ok(Step::Exit);
        };
        let Some(id) = self.parse_id(&raw_id).await? else {
            return Ok(Step::Continue);
        };

        match self.service.delete(id).await? {
            Some(_) => self.println("🗑️ Record deleted!").await?,
            None => self.println("❌ Record not found.").await?,
        }
        Ok(Step::Continue)
    }

    async fn search(&mut self) -> Result<Step> {
        let Some(keyword) = self.prompt("Enter search keyword: ").await? else {
            return Ok(Step::Exit);
        };

        let results = self.service.search(&keyword).await?;
        if results.is_empty() {
            self.println("No records found.").await?;
            return Ok(Step::Continue);
        }

        self.println(&format!("\nFound {} matching record(s):", results.len())).await?;
        for (index, record) in results.iter().enumerate() {
            self.println(&format!("{}. {}", index + 1, summary_line(record))).await?;
        }
        Ok(Step::Continue)
    }

    async fn sort(&mut self) -> Result<Step> {
        self.println("\nSort Options:\n1) Name\n2) Creation Date").await?;
        let Some(field_choice) = self.prompt("Choose field (1/2): ").await? else {
            return Ok(Step::Exit);
        };
        let field = match field_choice.trim() {
            "2" => SortField::CreatedAt,
            _ => SortField::Name,
        };
        let Some(order) = self.prompt("Order (asc/desc): ").await? else {
            return Ok(Step::Exit);
        };
        let direction = SortDirection::parse(&order);

        let sorted = self.service.sort_by(SortSpec::new(field, direction)).await?;
        if sorted.is_empty() {
            self.println("No records found.").await?;
            return Ok(Step::Continue);
        }

        let label = match field {
            SortField::CreatedAt => "creation date",
            _ => "name",
        };
        self.println(&format!("\nSorted by {} ({}):", label, direction.as_str())).await?;
        for record in &sorted {
            self.println(&format!(
                "ID: {} | Name: {} | Created: {} | Value: {}",
                record.id, record.name, record.created_at, record.value
            ))
            .await?;
        }
        Ok(Step::Continue)
    }

    async fn export(&mut self) -> Result<Step> {
        let path = self.service.export_to_text().await?;
        self.println(&format!("✅ Data exported successfully to {}", path.display())).await?;
        Ok(Step::Continue)
    }

    async fn statistics(&mut self) -> Result<Step> {
        let stats = self.service.statistics().await?;
        let report = format!(
            "\nVault Statistics:\n-------------------\n\
             Total Records: {}\n\
             Last Modified: {}\n\
             Longest Name: {} ({} chars)\n\
             Earliest Record: {}\n\
             Latest Record: {}",
            stats.total_records,
            stats.last_modified,
            stats.longest_name,
            stats.longest_name_length,
            stats.earliest,
            stats.latest,
        );
        self.println(&report).await?;
        Ok(Step::Continue)
    }

    // =========================================================================
    // Stream Helpers
    // =========================================================================

    /// Print `text` and read one line; `None` at end of input
    ///
    /// Bytes that are not valid UTF-8 become U+FFFD instead of failing the
    /// read.
    async fn prompt(&mut self, text: &str) -> Result<Option<String>> {
        self.write(text).await?;

        let mut bytes = Vec::new();
        if self.input.read_until(b'\n', &mut bytes).await? == 0 {
            return Ok(None);
        }
        let line = String::from_utf8_lossy(&bytes);
        Ok(Some(line.trim_end_matches(['\r', '\n']).to_string()))
    }

    /// Parse a record id, printing a message when it is not a number
    async fn parse_id(&mut self, raw: &str) -> Result<Option<i64>> {
        match raw.trim().parse() {
            Ok(id) => Ok(Some(id)),
            Err(_) => {
                self.println("❌ Invalid record ID.").await?;
                Ok(None)
            }
        }
    }

    async fn println(&mut self, text: &str) -> Result<()> {
        self.write(text).await?;
        self.write("\n").await
    }

    async fn write(&mut self, text: &str) -> Result<()> {
        self.output.write_all(text.as_bytes()).await?;
        self.output.flush().await?;
        Ok(())
    }
}

fn summary_line(record: &Record) -> String {
    format!("ID: {} | Name: {} | Value: {}", record.id, record.name, record.value)
}
