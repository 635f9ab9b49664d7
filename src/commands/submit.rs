use crate::api::Mode;
use crate::commands::Out;
use crate::error::{ErrorType, IntoResult, Res};
use crate::model::{Entry, BATCH_SIZE};
use crate::register::{Register, Submission};
use crate::{utils, Config, Result};
use anyhow::{ensure, Context};
use std::io::Cursor;
use std::path::Path;
use tracing::debug;

/// Submits one batch of entries read from the CSV file at `path`.
///
/// The file has the header `plate,quantity,value,fee,addition,exited,method`; missing columns
/// are treated as empty. It may hold at most eight entries.
pub async fn submit(config: Config, mode: Mode, path: &Path) -> Result<Out<Submission>> {
    let csv_data = utils::read(path).await.pub_result(ErrorType::Request)?;
    let entries = read_entries(&csv_data).pub_result(ErrorType::Request)?;
    debug!("Read {} entries from {}", entries.len(), path.display());

    let mut register = Register::new(config, mode).await?;
    let submission = register
        .submit(&entries)
        .await
        .pub_result(ErrorType::Sheet)?;

    let message = match submission.count() {
        0 => "Nenhum registro preenchido, nada foi enviado".to_string(),
        n => format!("✅ {n} registros enviados com sucesso!"),
    };
    Ok(Out::new(message, submission))
}

/// Parses a batch of entries from CSV text. More than eight entries is an error.
fn read_entries(csv_data: &str) -> Res<Vec<Entry>> {
    let mut rdr = csv::ReaderBuilder::new()
        .flexible(true)
        .trim(csv::Trim::Headers)
        .from_reader(Cursor::new(csv_data.as_bytes()));

    let mut entries = Vec::new();
    for (i, result) in rdr.deserialize::<Entry>().enumerate() {
        let entry = result.with_context(|| format!("Unable to read entry {}", i + 1))?;
        entries.push(entry);
    }
    ensure!(
        entries.len() <= BATCH_SIZE,
        "A batch holds at most {BATCH_SIZE} entries, found {}",
        entries.len()
    );
    Ok(entries)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::PaymentMethod;
    use crate::test::TestEnv;

    #[test]
    fn test_read_entries() {
        let csv_data = "plate,quantity,value,fee,addition,exited,method\n\
                        abc1234,2,\"R$ 10,50\",,,,Dinheiro\n\
                        ,,5,,,,\n";
        let entries = read_entries(csv_data).unwrap();
        assert_eq!(entries.len(), 2);
        assert_eq!(entries[0].plate, "abc1234");
        assert_eq!(entries[0].value, "R$ 10,50");
        assert_eq!(entries[0].method, PaymentMethod::Dinheiro);
        assert_eq!(entries[1].method, PaymentMethod::Pix);
    }

    #[test]
    fn test_read_entries_partial_header() {
        let entries = read_entries("plate,value\nXYZ9876,20\n").unwrap();
        assert_eq!(entries[0].plate, "XYZ9876");
        assert_eq!(entries[0].quantity, "");
    }

    #[test]
    fn test_read_entries_too_many() {
        let mut csv_data = String::from("plate\n");
        for i in 0..9 {
            csv_data.push_str(&format!("P{i}\n"));
        }
        let err = read_entries(&csv_data).unwrap_err();
        assert!(err.to_string().contains("at most 8"));
    }

    #[test]
    fn test_read_entries_unknown_method() {
        let err = read_entries("plate,method\nA,Cheque\n").unwrap_err();
        assert!(err.to_string().contains("entry 1"));
    }

    #[tokio::test]
    async fn test_submit_file() {
        let env = TestEnv::new().await;
        let path = env.root().join("batch.csv");
        utils::write(&path, "plate,quantity,value\nabc1234,3,15\n,,\n")
            .await
            .unwrap();

        let out = submit(env.config(), Mode::Test, &path).await.unwrap();

        assert_eq!(out.message(), "✅ 1 registros enviados com sucesso!");
        let submission = out.structure().unwrap();
        assert_eq!(submission.first_row(), Some(7));
        assert_eq!(submission.rows()[0].quantity(), 3);
    }

    #[tokio::test]
    async fn test_submit_missing_file() {
        let env = TestEnv::new().await;
        let err = submit(env.config(), Mode::Test, &env.root().join("nope.csv"))
            .await
            .unwrap_err();
        assert_eq!(err.error_type(), ErrorType::Request);
    }
}
