use crate::api::BookRecord;

/// Form state for the create and edit surfaces.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct BookDraft {
    pub title: String,
    pub author: String,
    pub publisher: String,
    pub published_date: String,
    pub pages: String,
    pub description: String,
}

impl BookDraft {
    pub fn from_record(record: &BookRecord) -> Self {
        Self {
            title: record.title.clone(),
            author: record.author.clone(),
            publisher: record.publisher.clone(),
            published_date: record.published_date.clone(),
            pages: record.pages.clone(),
            description: record.description.clone(),
        }
    }

    /// Mirrors the server's required-field policy to spare a round trip.
    /// Not authoritative: the server re-validates independently.
    pub fn validate(&self) -> Result<(), String> {
        let fields = [
            &self.title,
            &self.author,
            &self.publisher,
            &self.published_date,
            &self.pages,
            &self.description,
        ];
        if fields.iter().any(|value| value.trim().is_empty()) {
            return Err("All fields are required.".to_string());
        }
        Ok(())
    }

    pub(crate) fn field_entries(&self) -> Vec<(&'static str, String)> {
        vec![
            ("title", self.title.clone()),
            ("author", self.author.clone()),
            ("publisher", self.publisher.clone()),
            ("publishedDate", self.published_date.clone()),
            ("pages", self.pages.clone()),
            ("description", self.description.clone()),
        ]
    }
}

/// The overlay surfaces of the catalog page. At most one is open.
#[derive(Debug, Clone, PartialEq)]
pub enum Surface {
    Preview { id: String },
    Create { draft: BookDraft, busy: bool },
    Edit { id: String, draft: BookDraft, busy: bool },
}

/// Local mirror of the server's catalog. Every mutating response is the
/// sole source of truth for its record: entries are prepended, replaced
/// or removed by value, never re-sorted or merged.
#[derive(Debug, Default)]
pub struct CatalogView {
    books: Vec<BookRecord>,
    surface: Option<Surface>,
}

impl CatalogView {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replaces the whole list with the server's listing (initial fetch).
    pub fn load(&mut self, records: Vec<BookRecord>) {
        self.books = records;
    }

    pub fn books(&self) -> &[BookRecord] {
        &self.books
    }

    pub fn surface(&self) -> Option<&Surface> {
        self.surface.as_ref()
    }

    /// Prepends the created record; the list stays newest-first without
    /// re-sorting.
    pub fn apply_created(&mut self, record: BookRecord) {
        self.books.insert(0, record);
    }

    /// Replaces the matching entry wholesale with the server's record.
    pub fn apply_updated(&mut self, record: BookRecord) -> bool {
        match self.books.iter_mut().find(|book| book.id == record.id) {
            Some(entry) => {
                *entry = record;
                true
            }
            None => false,
        }
    }

    /// Removes the entry. Only call after the delete succeeded; a failed
    /// delete leaves the list untouched.
    pub fn apply_deleted(&mut self, id: &str) -> bool {
        let before = self.books.len();
        self.books.retain(|book| book.id != id);
        self.books.len() != before
    }

    pub fn open_preview(&mut self, id: &str) -> bool {
        if !self.books.iter().any(|book| book.id == id) {
            return false;
        }
        self.surface = Some(Surface::Preview { id: id.to_string() });
        true
    }

    pub fn open_create(&mut self) {
        self.surface = Some(Surface::Create {
            draft: BookDraft::default(),
            busy: false,
        });
    }

    pub fn open_edit(&mut self, id: &str) -> bool {
        let Some(record) = self.books.iter().find(|book| book.id == id) else {
            return false;
        };
        self.surface = Some(Surface::Edit {
            id: id.to_string(),
            draft: BookDraft::from_record(record),
            busy: false,
        });
        true
    }

    /// Closing discards any unsaved draft input.
    pub fn close_surface(&mut self) {
        self.surface = None;
    }

    pub fn draft_mut(&mut self) -> Option<&mut BookDraft> {
        match self.surface.as_mut() {
            Some(Surface::Create { draft, .. }) | Some(Surface::Edit { draft, .. }) => Some(draft),
            _ => None,
        }
    }

    /// Marks the open form surface busy. Refuses when no form is open or
    /// a submit is already in flight.
    pub fn begin_submit(&mut self) -> bool {
        match self.surface.as_mut() {
            Some(Surface::Create { busy, .. }) | Some(Surface::Edit { busy, .. }) => {
                if *busy {
                    false
                } else {
                    *busy = true;
                    true
                }
            }
            _ => false,
        }
    }

    pub fn finish_submit(&mut self) {
        if let Some(Surface::Create { busy, .. }) | Some(Surface::Edit { busy, .. }) =
            self.surface.as_mut()
        {
            *busy = false;
        }
    }
}
