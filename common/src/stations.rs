//! 医師別レポートの列（診察室・検査）定義
//!
//! 照合結果の項目（小文字化）がパターンのいずれかを含めば「+」。
//! 部分一致なので "венеролог" は "дерматовенеролог" にも一致する。

use crate::rules::MatchResult;

/// 判定対象の列
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StationKind {
    /// 医師リストを見る
    Doctor,
    /// 検査・分析リストを見る
    Test,
}

#[derive(Debug, Clone, Copy)]
pub struct Station {
    /// レポートの列見出し
    pub column: &'static str,
    pub kind: StationKind,
    pub patterns: &'static [&'static str],
}

pub const STATIONS: &[Station] = &[
    Station { column: "Врач-терапевт 2 каб", kind: StationKind::Doctor, patterns: &["терапевт"] },
    Station { column: "Врач-психиатр __ каб", kind: StationKind::Doctor, patterns: &["психиатр"] },
    Station { column: "Врач-психиатр-нарколог __ каб", kind: StationKind::Doctor, patterns: &["нарколог"] },
    Station { column: "Врач-профпатолог __ каб", kind: StationKind::Doctor, patterns: &["профпатолог"] },
    Station { column: "Врач-невролог 7 каб", kind: StationKind::Doctor, patterns: &["невролог"] },
    Station { column: "Врач-гинеколог 9 каб", kind: StationKind::Doctor, patterns: &["гинеколог"] },
    Station {
        column: "Врач-оториноларинголог 6 каб",
        kind: StationKind::Doctor,
        patterns: &["оториноларинголог", "лор"],
    },
    Station {
        column: "Врач-дерматовенеролог 9 каб",
        kind: StationKind::Doctor,
        patterns: &["дерматовенеролог", "дерматолог", "венеролог"],
    },
    Station { column: "Врач-офтальмолог 4 каб", kind: StationKind::Doctor, patterns: &["офтальмолог"] },
    Station { column: "Врач-хирург 8 каб", kind: StationKind::Doctor, patterns: &["хирург"] },
    Station { column: "Врач-стоматолог", kind: StationKind::Doctor, patterns: &["стоматолог"] },
    Station {
        column: "ФОГ",
        kind: StationKind::Test,
        patterns: &["фог", "флюорограф", "флюорография", "рентген грудной"],
    },
    Station { column: "Мамография", kind: StationKind::Test, patterns: &["маммограф", "маммография"] },
    Station { column: "Спирометрия", kind: StationKind::Test, patterns: &["спирометр"] },
    Station {
        column: "Тональная пороговая аудиометрия",
        kind: StationKind::Test,
        patterns: &["аудиометр", "тональная пороговая аудиометрия"],
    },
];

impl Station {
    pub fn is_required(&self, matched: &MatchResult) -> bool {
        match self.kind {
            StationKind::Doctor => matched.doctors.contains_any(self.patterns),
            StationKind::Test => {
                matched.inspections.contains_any(self.patterns)
                    || matched.analyses.contains_any(self.patterns)
            }
        }
    }
}

/// 全列の判定結果（STATIONS と同じ順）
pub fn mark_stations(matched: &MatchResult) -> Vec<bool> {
    STATIONS.iter().map(|s| s.is_required(matched)).collect()
}
