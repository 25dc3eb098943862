use anyhow::Result;
use clap::Parser;
use vr_review_harvester::cli::{Cli, Command};
use vr_review_harvester::utils::logging;
use vr_review_harvester::{App, Config};

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // 加载配置
    let mut config = Config::from_env();
    cli.apply(&mut config);

    // 初始化日志
    logging::init(config.verbose_logging);

    // 初始化并运行应用
    let app = App::initialize(config).await?;
    match cli.command {
        Command::Harvest { .. } => {
            let summary = app.run().await?;
            if summary.has_failures() {
                anyhow::bail!(
                    "{} 个游戏处理失败: {}",
                    summary.failed,
                    summary.failed_items.join(", ")
                );
            }
        }
        Command::Verify { watch, .. } => {
            app.verify(watch).await?;
        }
    }

    Ok(())
}
