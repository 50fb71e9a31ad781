use std::sync::atomic::{AtomicBool, Ordering};

use monoslot::{CreationPolicy, Singleton};

static BACKEND_UP: AtomicBool = AtomicBool::new(false);

struct Connection {
   endpoint: &'static str,
}

enum ConnectPolicy {}

impl CreationPolicy<Connection> for ConnectPolicy {
   type Handle = Box<Connection>;
   type Error = &'static str;

   fn create() -> Result<Box<Connection>, Self::Error> {
      println!("Attempting to connect...");
      if BACKEND_UP.load(Ordering::Relaxed) {
         Ok(Box::new(Connection {
            endpoint: "db://primary",
         }))
      } else {
         Err("backend is down")
      }
   }

   fn destroy(handle: Box<Connection>) {
      println!("Closing connection to {}", handle.endpoint);
      drop(handle);
   }
}

static CONNECTION: Singleton<Connection, ConnectPolicy> = Singleton::new();

fn main() {
   // First attempt fails; the slot stays empty and can be retried.
   match CONNECTION.try_instance() {
      Ok(_) => panic!("should have failed"),
      Err(e) => println!("Caught error: {e}"),
   }
   assert!(!CONNECTION.is_occupied());

   // The backend comes up; the next attempt succeeds.
   BACKEND_UP.store(true, Ordering::Relaxed);
   match CONNECTION.try_instance() {
      Ok(conn) => println!("Connected to {}", conn.endpoint),
      Err(_) => panic!("should have succeeded"),
   }
   assert!(CONNECTION.is_occupied());

   // Later accesses return the cached connection without reconnecting.
   let conn = CONNECTION.try_instance().expect("already connected");
   println!("Reusing connection to {}", conn.endpoint);
   // The registered teardown closes the connection after main returns.
}
