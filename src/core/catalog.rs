use crate::models::DatasetRecord;

/// Sort options offered on the datasets page
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortKey {
    Name,
    ImageCount,
    UpdatedAt,
}

impl SortKey {
    pub const ALL: [SortKey; 3] = [SortKey::Name, SortKey::ImageCount, SortKey::UpdatedAt];

    pub fn label(&self) -> &'static str {
        match self {
            SortKey::Name => "Name",
            SortKey::ImageCount => "Image count",
            SortKey::UpdatedAt => "Updated",
        }
    }
}

/// Reasons a new dataset name is refused
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CreateDatasetError {
    EmptyName,
    DuplicateName(String),
}

impl std::fmt::Display for CreateDatasetError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CreateDatasetError::EmptyName => write!(f, "Name cannot be empty"),
            CreateDatasetError::DuplicateName(name) => {
                write!(f, "A dataset named \"{}\" already exists", name)
            }
        }
    }
}

impl std::error::Error for CreateDatasetError {}

/// All datasets plus the searched and sorted view shown on screen
pub struct DatasetCatalog {
    all: Vec<DatasetRecord>,
    /// Indices into `all`, in display order
    visible: Vec<usize>,
    query: String,
    sort: Option<SortKey>,
}

impl DatasetCatalog {
    pub fn new(datasets: Vec<DatasetRecord>) -> Self {
        let visible = (0..datasets.len()).collect();
        Self {
            all: datasets,
            visible,
            query: String::new(),
            sort: None,
        }
    }

    /// Keep only datasets whose name contains `keyword`, ignoring case.
    /// An empty keyword shows everything.
    pub fn search(&mut self, keyword: &str) {
        self.query = keyword.to_string();
        self.refresh();
    }

    /// Order the visible datasets by `key`, ascending. The key is kept for
    /// later searches.
    pub fn sort_by(&mut self, key: SortKey) {
        self.sort = Some(key);
        self.apply_sort();
    }

    /// Add a new, unsynced dataset
    pub fn create(&mut self, name: &str) -> Result<&DatasetRecord, CreateDatasetError> {
        let name = name.trim();
        if name.is_empty() {
            return Err(CreateDatasetError::EmptyName);
        }
        if self.all.iter().any(|d| d.name == name) {
            return Err(CreateDatasetError::DuplicateName(name.to_string()));
        }

        let id = self.all.iter().map(|d| d.id + 1).max().unwrap_or(0);
        self.all.push(DatasetRecord::new(id, name));
        self.refresh();

        let index = self.all.len() - 1;
        Ok(&self.all[index])
    }

    pub fn visible(&self) -> impl Iterator<Item = &DatasetRecord> {
        self.visible.iter().map(move |&i| &self.all[i])
    }

    pub fn visible_count(&self) -> usize {
        self.visible.len()
    }

    pub fn all(&self) -> &[DatasetRecord] {
        &self.all
    }

    pub fn query(&self) -> &str {
        &self.query
    }

    pub fn sort_key(&self) -> Option<SortKey> {
        self.sort
    }

    fn refresh(&mut self) {
        let needle = self.query.to_lowercase();
        self.visible = self
            .all
            .iter()
            .enumerate()
            .filter(|(_, d)| needle.is_empty() || d.name.to_lowercase().contains(&needle))
            .map(|(i, _)| i)
            .collect();
        self.apply_sort();
    }

    fn apply_sort(&mut self) {
        let Some(key) = self.sort else {
            return;
        };
        let all = &self.all;
        match key {
            SortKey::Name => self.visible.sort_by(|&a, &b| all[a].name.cmp(&all[b].name)),
            SortKey::ImageCount => self.visible.sort_by_key(|&i| all[i].image_count),
            SortKey::UpdatedAt => self.visible.sort_by_key(|&i| all[i].updated_at),
        }
    }
}
