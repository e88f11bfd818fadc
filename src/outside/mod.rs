mod chromedriver;
mod command;
mod ffmpeg;
mod webdriver;

pub use chromedriver::ChromeDriver;
pub use command::CHROMEDRIVER;
pub use ffmpeg::{Ffmpeg, Stitcher};
pub use webdriver::{BrowserSession, ElementHandle, WebDriver};
