use crate::api::Mode;
use crate::commands::Out;
use crate::error::{ErrorType, IntoResult};
use crate::register::Register;
use crate::{server, Config, Result};
use std::net::SocketAddr;

/// Serves the entry form on `addr` until the process is interrupted. The spreadsheet is opened
/// once, before the server starts listening, so that a bad configuration is reported right away.
pub async fn serve(config: Config, mode: Mode, addr: SocketAddr) -> Result<Out<()>> {
    let register = Register::new(config, mode).await?;
    server::run(register, addr)
        .await
        .pub_result(ErrorType::Service)?;
    Ok("The form server has stopped".into())
}
