use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;

use monoslot::Singleton;

static CONSTRUCTED: AtomicUsize = AtomicUsize::new(0);

struct Logger {
   lines: Mutex<Vec<String>>,
}

impl Default for Logger {
   fn default() -> Self {
      // Runs only once, no matter how many threads race for the instance.
      CONSTRUCTED.fetch_add(1, Ordering::Relaxed);
      println!("Constructing the logger...");
      Self {
         lines: Mutex::new(Vec::new()),
      }
   }
}

impl Logger {
   fn log(&self, message: &str) {
      println!("[LOG] {message}");
      self.lines.lock().unwrap().push(message.to_string());
   }
}

static LOGGER: Singleton<Logger> = Singleton::new();

fn main() {
   let threads: Vec<_> = (0..5)
      .map(|i| {
         std::thread::spawn(move || {
            LOGGER.instance().log(&format!("hello from thread {i}"));
         })
      })
      .collect();

   for t in threads {
      t.join().unwrap();
   }

   LOGGER.instance().log("all threads joined");

   assert_eq!(CONSTRUCTED.load(Ordering::Relaxed), 1); // Constructed only once
   assert_eq!(LOGGER.instance().lines.lock().unwrap().len(), 6);
   println!("One logger instance, {} lines logged", 6);
}
