use crate::files::FileHandle;

/// Creates the display handle for a newly selected file.
///
/// The handle is released when it is dropped. In the desktop app it is an
/// `egui::TextureHandle`, which frees its texture on drop; tests use a
/// counting handle. Any `FnMut(&FileHandle) -> H` closure is a factory.
pub trait PreviewFactory {
    type Handle;

    fn create(&mut self, file: &FileHandle) -> Self::Handle;
}

impl<F, H> PreviewFactory for F
where
    F: FnMut(&FileHandle) -> H,
{
    type Handle = H;

    fn create(&mut self, file: &FileHandle) -> H {
        self(file)
    }
}

/// A file in the selection list together with its preview handle.
///
/// The entry owns the handle, so the handle lives exactly as long as the
/// entry does.
#[derive(Debug)]
pub struct SelectedFile<H> {
    file: FileHandle,
    preview: H,
}

impl<H> SelectedFile<H> {
    pub fn file(&self) -> &FileHandle {
        &self.file
    }

    pub fn preview(&self) -> &H {
        &self.preview
    }
}

/// Ordered list of files awaiting submission.
#[derive(Debug)]
pub struct Selection<H> {
    entries: Vec<SelectedFile<H>>,
}

impl<H> Default for Selection<H> {
    fn default() -> Self {
        Self { entries: Vec::new() }
    }
}

impl<H> Selection<H> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append files in the given order, creating one preview per file.
    /// Duplicates are kept.
    pub fn add_files<I, P>(&mut self, files: I, previews: &mut P)
    where
        I: IntoIterator<Item = FileHandle>,
        P: PreviewFactory<Handle = H>,
    {
        for file in files {
            let preview = previews.create(&file);
            log::debug!("Selected {} ({} bytes)", file.name, file.bytes.len());
            self.entries.push(SelectedFile { file, preview });
        }
    }

    /// Release the preview at `index` and remove the entry. Later entries
    /// shift down by one. Returns `false` when `index` is out of range.
    pub fn remove_file(&mut self, index: usize) -> bool {
        if index >= self.entries.len() {
            log::debug!(
                "Ignoring remove of index {index}; selection has {} file(s)",
                self.entries.len()
            );
            return false;
        }
        let SelectedFile { file, preview } = self.entries.remove(index);
        drop(preview);
        log::debug!("Removed {}", file.name);
        true
    }

    /// Release every preview and empty the list.
    pub fn clear(&mut self) {
        self.entries.clear();
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn get(&self, index: usize) -> Option<&SelectedFile<H>> {
        self.entries.get(index)
    }

    pub fn iter(&self) -> std::slice::Iter<'_, SelectedFile<H>> {
        self.entries.iter()
    }

    /// Copies of the selected files, in order, for building a request.
    pub fn snapshot(&self) -> Vec<FileHandle> {
        self.entries.iter().map(|e| e.file.clone()).collect()
    }
}

impl<'a, H> IntoIterator for &'a Selection<H> {
    type Item = &'a SelectedFile<H>;
    type IntoIter = std::slice::Iter<'a, SelectedFile<H>>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}
