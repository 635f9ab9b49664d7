use crate::api::Mode;
use crate::commands::Out;
use crate::error::{ErrorType, IntoResult};
use crate::model::DATE_FORMAT;
use crate::register::{Register, Today};
use crate::{Config, Result};

/// Shows how many vehicles and boletos have been recorded today. Like opening the form, this
/// creates today's worksheet if it does not exist yet.
pub async fn totals(config: Config, mode: Mode) -> Result<Out<Today>> {
    let mut register = Register::new(config, mode).await?;
    let today = register.today().await.pub_result(ErrorType::Sheet)?;
    let totals = today.totals();
    let message = format!(
        "{}: {} veículos, {} boletos",
        today.date().format(DATE_FORMAT),
        totals.vehicles(),
        totals.boletos()
    );
    Ok(Out::new(message, today))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test::TestEnv;

    #[tokio::test]
    async fn test_totals_of_new_day() {
        let env = TestEnv::new().await;
        let out = totals(env.config(), Mode::Test).await.unwrap();
        assert!(out.message().ends_with("0 veículos, 0 boletos"));
        let today = out.structure().unwrap();
        assert_eq!(today.totals().vehicles(), 0);
        assert!(env.get_state().find(today.worksheet()).is_some());
    }
}
