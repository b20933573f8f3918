/// 板块 -> 股票代码列表，保持发现顺序
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SectorIndex {
    sectors: Vec<(String, Vec<String>)>,
}

impl SectorIndex {
    pub fn new() -> Self {
        Self::default()
    }

    /// 将股票加入所属板块，板块不存在时追加到末尾
    pub fn insert(&mut self, sector: &str, symbol: &str) {
        match self.sectors.iter_mut().find(|(name, _)| name == sector) {
            Some((_, symbols)) => symbols.push(symbol.to_string()),
            None => self.sectors.push((sector.to_string(), vec![symbol.to_string()])),
        }
    }

    pub fn get(&self, sector: &str) -> Option<&[String]> {
        self.sectors
            .iter()
            .find(|(name, _)| name == sector)
            .map(|(_, symbols)| symbols.as_slice())
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &[String])> {
        self.sectors.iter().map(|(name, symbols)| (name.as_str(), symbols.as_slice()))
    }

    pub fn len(&self) -> usize {
        self.sectors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sectors.is_empty()
    }

    pub fn symbol_count(&self) -> usize {
        self.sectors.iter().map(|(_, symbols)| symbols.len()).sum()
    }
}

/// 各板块归一化后的涨跌幅序列，首个值恒为 0.0
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PerformanceSeries {
    series: Vec<(String, Vec<f64>)>,
}

impl PerformanceSeries {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, sector: &str, values: Vec<f64>) {
        self.series.push((sector.to_string(), values));
    }

    pub fn get(&self, sector: &str) -> Option<&[f64]> {
        self.series
            .iter()
            .find(|(name, _)| name == sector)
            .map(|(_, values)| values.as_slice())
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &[f64])> {
        self.series.iter().map(|(name, values)| (name.as_str(), values.as_slice()))
    }

    pub fn len(&self) -> usize {
        self.series.len()
    }

    pub fn is_empty(&self) -> bool {
        self.series.is_empty()
    }

    /// 最新值最高的板块，并列时取先出现的
    pub fn best(&self) -> Option<(&str, f64)> {
        let mut best: Option<(&str, f64)> = None;
        for (name, values) in self.iter() {
            let Some(&last) = values.last() else { continue };
            match best {
                Some((_, current)) if last <= current => {}
                _ => best = Some((name, last)),
            }
        }
        best
    }
}
