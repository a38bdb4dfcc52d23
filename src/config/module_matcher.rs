/// カスタムモジュール判定用の構造体
///
/// 許可リストの各エントリについて、パッケージ名の完全一致または
/// モジュール名の前方一致でマッチする
#[derive(Debug, Clone, Default)]
pub struct ModuleMatcher {
    entries: Vec<String>,
}

impl ModuleMatcher {
    /// 許可リストからModuleMatcherを作成（空白のみのエントリは無視）
    pub fn new(entries: &[String]) -> Self {
        let entries = entries
            .iter()
            .map(|e| e.trim())
            .filter(|e| !e.is_empty())
            .map(str::to_string)
            .collect();
        Self { entries }
    }

    /// ノードがカスタムモジュール由来かどうかを判定
    pub fn is_custom(&self, module: Option<&str>, module_package: Option<&str>) -> bool {
        self.entries.iter().any(|entry| {
            module_package == Some(entry.as_str())
                || module.is_some_and(|m| m.starts_with(entry.as_str()))
        })
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
