//! Interactive command shell — a thin dispatcher over the core
//! engine's public API. This is the only place in the crate that
//! prompts for input or prints protocol-facing output; the engine
//! itself never touches stdin/stdout beyond the ambient logging
//! macros.

use std::fs;
use std::io::{self, Write};

use crate::config::Config;
use crate::db::btree::loader::parse_unsigned_field;
use crate::db::btree::{load, BTree};
use crate::error::EngineError;
use crate::info;

pub struct Shell {
    config: Config,
    tree: Option<BTree>,
}

impl Shell {
    pub fn new(config: Config) -> Self {
        crate::log::debug(&format!(
            "shell configured with page_cache_capacity={} data_dir={}",
            config.page_cache_capacity, config.data_dir
        ));
        Self { config, tree: None }
    }

    /// Run the command loop until `QUIT`. Returns the process exit
    /// code (0 on a clean quit).
    pub fn run(&mut self) -> i32 {
        loop {
            print_menu();
            let command = match prompt("\nEnter command: ") {
                Ok(line) => line.trim().to_uppercase(),
                Err(_) => return 1,
            };

            match command.as_str() {
                "QUIT" => {
                    info!("shell exiting on QUIT");
                    return 0;
                }
                "CREATE" => self.cmd_create(),
                "OPEN" => self.cmd_open(),
                "INSERT" => self.cmd_insert(),
                "SEARCH" => self.cmd_search(),
                "LOAD" => self.cmd_load(),
                "PRINT" => self.cmd_print(),
                "EXTRACT" => self.cmd_extract(),
                "" => {}
                _ => println!("Error: Invalid command"),
            }
        }
    }

    fn require_open(&mut self) -> Option<&mut BTree> {
        if self.tree.is_none() {
            println!("Error: No index file is currently open");
        }
        self.tree.as_mut()
    }

    /// Resolve a user-supplied filename against the configured data
    /// directory; an absolute path is left untouched.
    fn resolve_path(&self, filename: &str) -> std::path::PathBuf {
        let path = std::path::Path::new(filename);
        if path.is_absolute() || self.config.data_dir == "." {
            path.to_path_buf()
        } else {
            std::path::Path::new(&self.config.data_dir).join(path)
        }
    }

    fn cmd_create(&mut self) {
        let Ok(filename) = prompt("Enter filename: ") else { return };
        let filename = filename.trim();
        if filename.is_empty() {
            println!("Error: No filename given");
            return;
        }

        let path = self.resolve_path(filename);
        let overwrite = if path.exists() {
            match prompt("File already exists. Overwrite? (y/n): ") {
                Ok(answer) if answer.trim().eq_ignore_ascii_case("y") => true,
                _ => {
                    println!("Operation cancelled");
                    return;
                }
            }
        } else {
            false
        };

        match BTree::create(&path, &self.config.magic, self.config.page_cache_capacity, overwrite) {
            Ok(tree) => {
                println!("Created new index file: {}", filename);
                self.tree = Some(tree);
            }
            Err(e) => println!("Error creating file: {}", e),
        }
    }

    fn cmd_open(&mut self) {
        let Ok(filename) = prompt("Enter filename: ") else { return };
        let filename = filename.trim();
        let path = self.resolve_path(filename);

        match BTree::open(&path, &self.config.magic, self.config.page_cache_capacity) {
            Ok(tree) => {
                println!("Opened index file: {}", filename);
                self.tree = Some(tree);
            }
            Err(EngineError::BadMagic { .. }) => println!("Error: Invalid file format"),
            Err(EngineError::Io { ref source, .. }) if source.kind() == std::io::ErrorKind::NotFound => {
                println!("Error: File not found")
            }
            Err(e) => println!("Error opening file: {}", e),
        }
    }

    fn cmd_insert(&mut self) {
        if self.require_open().is_none() {
            return;
        }

        let Ok(key_input) = prompt("Enter key: ") else { return };
        let Ok(value_input) = prompt("Enter value: ") else { return };

        let (key, value) = match (
            parse_unsigned_field(key_input.trim()),
            parse_unsigned_field(value_input.trim()),
        ) {
            (Ok(k), Ok(v)) => (k, v),
            _ => {
                println!("Error: Keys and values must be unsigned integers");
                return;
            }
        };

        match self.tree.as_mut().unwrap().insert(key, value) {
            Ok(()) => println!("Insert successful"),
            Err(EngineError::DuplicateKey(_)) => println!("Error: Key already exists"),
            Err(e) => println!("Error: {}", e),
        }
    }

    fn cmd_search(&mut self) {
        if self.require_open().is_none() {
            return;
        }

        let Ok(key_input) = prompt("Enter key: ") else { return };
        let key = match parse_unsigned_field(key_input.trim()) {
            Ok(k) => k,
            Err(_) => {
                println!("Error: Key must be an unsigned integer");
                return;
            }
        };

        match self.tree.as_mut().unwrap().search(key) {
            Ok(value) => println!("Key: {}, Value: {}", key, value),
            Err(EngineError::NotFound(_)) => println!("Error: Key not found"),
            Err(e) => println!("Error: {}", e),
        }
    }

    fn cmd_load(&mut self) {
        if self.require_open().is_none() {
            return;
        }
        let Ok(filename) = prompt("Enter input filename: ") else { return };
        let filename = filename.trim();
        let path = self.resolve_path(filename);

        match fs::read_to_string(&path) {
            Ok(contents) => match load(self.tree.as_mut().unwrap(), &contents) {
                Ok(summary) => println!(
                    "Load complete: {} pairs inserted, {} errors",
                    summary.success,
                    summary.duplicate + summary.malformed + summary.negative
                ),
                Err(e) => println!("Error loading file: {}", e),
            },
            Err(_) => println!("Error: File not found"),
        }
    }

    fn cmd_print(&mut self) {
        if self.require_open().is_none() {
            return;
        }
        let tree = self.tree.as_mut().unwrap();
        if tree.is_empty() {
            println!("Tree is empty");
            return;
        }
        match tree.collect_pairs() {
            Ok(pairs) => {
                for (key, value) in pairs {
                    println!("Key: {}, Value: {}", key, value);
                }
            }
            Err(e) => println!("Error printing tree: {}", e),
        }
    }

    fn cmd_extract(&mut self) {
        if self.require_open().is_none() {
            return;
        }

        let Ok(filename) = prompt("Enter output filename: ") else { return };
        let filename = filename.trim().to_string();
        let path = self.resolve_path(&filename);

        if path.exists() {
            match prompt("File already exists. Overwrite? (y/n): ") {
                Ok(answer) if answer.trim().eq_ignore_ascii_case("y") => {}
                _ => {
                    println!("Operation cancelled");
                    return;
                }
            }
        }

        let tree = self.tree.as_mut().unwrap();
        if tree.is_empty() {
            println!("Tree is empty");
            return;
        }

        match tree.collect_pairs() {
            Ok(pairs) => {
                let mut out = String::new();
                for (key, value) in &pairs {
                    out.push_str(&format!("{},{}\n", key, value));
                }
                match fs::write(&path, out) {
                    Ok(()) => println!("Successfully exported {} pairs to {}", pairs.len(), filename),
                    Err(e) => println!("Error extracting to file: {}", e),
                }
            }
            Err(e) => println!("Error extracting to file: {}", e),
        }
    }
}

fn print_menu() {
    println!("\nIndex File Management System");
    println!("CREATE - Create a new index file");
    println!("OPEN - Open an existing index file");
    println!("INSERT - Insert a key/value pair");
    println!("SEARCH - Search for a key");
    println!("LOAD - Load pairs from file");
    println!("PRINT - Print all key/value pairs");
    println!("EXTRACT - Save pairs to file");
    println!("QUIT - Exit program");
}

fn prompt(label: &str) -> io::Result<String> {
    print!("{}", label);
    io::stdout().flush()?;
    let mut line = String::new();
    io::stdin().read_line(&mut line)?;
    if line.is_empty() {
        return Err(io::Error::new(io::ErrorKind::UnexpectedEof, "stdin closed"));
    }
    Ok(line)
}
