use anyhow::Context;
use sectorhub::analysis::{SamplingWindow, SectorAnalyzer};
use sectorhub::config::Config;
use sectorhub::data_provider::StoredDataProvider;

fn main() -> anyhow::Result<()> {
    let config = Config::new().with_data_dir(&std::env::args().nth(1).unwrap_or_else(|| "data".to_string()));

    // 读取 scrape / prices 子命令保存的文件
    let provider = StoredDataProvider::load(&config.symbols_path(), &config.prices_path())
        .with_context(|| format!("loading files from {}", config.data_dir))?;

    println!("股票数量: {}", provider.records().len());
    println!("行情记录数量: {}", provider.prices().len());

    for (sector, symbols) in provider.sector_index().iter() {
        println!("{:<30} {:>4} 只", sector, symbols.len());
    }

    if let Some(record) = provider.records().first() {
        println!("\n{} ({})", record.name, record.symbol);
        println!("板块: {}", record.sector.as_deref().unwrap_or("未知"));
        println!("行业: {}", record.industry.as_deref().unwrap_or("未知"));
        println!("城市: {}", record.city.as_deref().unwrap_or("未知"));
    }

    if provider.prices().is_empty() {
        println!("\n没有行情数据，先运行 prices 子命令");
        return Ok(());
    }

    let analyzer = SectorAnalyzer::new(
        SamplingWindow::new(config.window_span, config.window_step),
        config.notional,
    );
    let analysis = analyzer
        .analyze(provider.sector_index(), provider.prices())
        .context("sector analysis failed")?;

    println!("\n{:<30} {:>10}", "板块", "涨跌幅(%)");
    println!("{:-<42}", "");
    for (sector, values) in analysis.series.iter() {
        println!("{:<30} {:>10.2}", sector, values.last().copied().unwrap_or_default());
    }
    if let Some(best) = analysis.describe_best(config.window_span) {
        println!("\n{}", best);
    }

    Ok(())
}
